// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Connections are handed out per call and released on drop
// - The repository never knows where a connection comes from
// - Every connection enforces foreign keys

use std::ops::Deref;
use std::time::Duration;

use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};

use super::config::DatabaseConfig;
use crate::error::{DataAccessError, DataResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Source of live connections for the repositories.
///
/// Implementations decide whether a connection is freshly opened or
/// checked out of a pool; callers only see a [`ScopedConnection`] that is
/// released when it goes out of scope.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionProvider: Send + Sync {
    fn get_connection(&self) -> DataResult<ScopedConnection>;
}

enum Handle {
    Pooled(PooledConn),
    Owned(Connection),
}

/// A connection borrowed for the duration of one repository operation.
///
/// Dropping it returns a pooled connection to its pool or closes an owned
/// one. Statements and row cursors borrow from it, so they are always
/// released first.
pub struct ScopedConnection {
    handle: Handle,
}

impl ScopedConnection {
    pub fn pooled(conn: PooledConn) -> Self {
        Self {
            handle: Handle::Pooled(conn),
        }
    }

    pub fn owned(conn: Connection) -> Self {
        Self {
            handle: Handle::Owned(conn),
        }
    }

    fn kind(&self) -> &'static str {
        match self.handle {
            Handle::Pooled(_) => "pooled",
            Handle::Owned(_) => "owned",
        }
    }
}

impl Deref for ScopedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match &self.handle {
            Handle::Pooled(conn) => &**conn,
            Handle::Owned(conn) => conn,
        }
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        debug!("Releasing {} database connection", self.kind());
    }
}

/// Pragmas every connection needs before it is used.
///
/// SQLite ships with foreign key enforcement off, so the genre reference of
/// a movie is only checked once this has run on the connection.
pub fn configure_connection(conn: &Connection, busy_timeout_ms: u32) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(u64::from(busy_timeout_ms)))?;
    Ok(())
}

/// Create a connection pool
///
/// Pool configuration comes from [`DatabaseConfig`]; each new pooled
/// connection runs [`configure_connection`].
pub fn create_connection_pool(config: &DatabaseConfig) -> DataResult<ConnectionPool> {
    config.validate()?;
    config.ensure_parent_dir()?;

    let busy_timeout_ms = config.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(&config.path)
        .with_init(move |conn| configure_connection(conn, busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .map_err(|e| DataAccessError::connectivity("Failed to create connection pool", e))?;

    info!(
        "Connection pool ready at {:?} (max {} connections)",
        config.path, config.max_connections
    );
    Ok(pool)
}

/// Provider backed by an r2d2 pool.
#[derive(Clone)]
pub struct PooledConnectionProvider {
    pool: ConnectionPool,
}

impl PooledConnectionProvider {
    pub fn new(config: &DatabaseConfig) -> DataResult<Self> {
        Ok(Self::from_pool(create_connection_pool(config)?))
    }

    pub fn from_pool(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl ConnectionProvider for PooledConnectionProvider {
    fn get_connection(&self) -> DataResult<ScopedConnection> {
        let conn = self
            .pool
            .get()
            .map_err(|e| DataAccessError::connectivity("Failed to get database connection", e))?;
        debug!("Checked out pooled database connection");
        Ok(ScopedConnection::pooled(conn))
    }
}

/// Provider that opens a new connection on every call and closes it when
/// the operation ends. Never creates the database file.
#[derive(Debug, Clone)]
pub struct FileConnectionProvider {
    config: DatabaseConfig,
}

impl FileConnectionProvider {
    pub fn new(config: DatabaseConfig) -> DataResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl ConnectionProvider for FileConnectionProvider {
    fn get_connection(&self) -> DataResult<ScopedConnection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&self.config.path, flags).map_err(|e| {
            DataAccessError::connectivity(
                format!("Failed to open database {:?}", self.config.path),
                e,
            )
        })?;
        configure_connection(&conn, self.config.busy_timeout_ms)
            .map_err(|e| DataAccessError::connectivity("Failed to configure connection", e))?;

        debug!("Opened database connection to {:?}", self.config.path);
        Ok(ScopedConnection::owned(conn))
    }
}

/// Create a standalone connection (for testing)
///
/// This creates an in-memory database with foreign keys enabled.
pub fn create_test_connection() -> DataResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| DataAccessError::connectivity("Failed to open in-memory database", e))?;
    configure_connection(&conn, 0)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign_keys_enabled(conn: &Connection) -> bool {
        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        enabled == 1
    }

    #[test]
    fn test_test_connection() {
        let conn = create_test_connection().unwrap();

        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);
        assert!(foreign_keys_enabled(&conn));
    }

    #[test]
    fn test_pooled_provider_enables_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DatabaseConfig::in_path(dir.path().join("data/movies.db"));
        config.max_connections = 2;

        let provider = PooledConnectionProvider::new(&config).unwrap();
        let conn = provider.get_connection().unwrap();

        assert!(foreign_keys_enabled(&conn));
        assert!(config.path.exists());
    }

    #[test]
    fn test_pooled_connection_returns_to_pool_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DatabaseConfig::in_path(dir.path().join("movies.db"));
        config.max_connections = 1;
        let provider = PooledConnectionProvider::new(&config).unwrap();

        {
            let _conn = provider.get_connection().unwrap();
            assert_eq!(provider.pool().state().idle_connections, 0);
        }

        assert_eq!(provider.pool().state().idle_connections, 1);
        // The single slot is free again.
        provider.get_connection().unwrap();
    }

    #[test]
    fn test_file_provider_opens_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.db");
        Connection::open(&path).unwrap();

        let provider = FileConnectionProvider::new(DatabaseConfig::in_path(&path)).unwrap();
        let conn = provider.get_connection().unwrap();

        assert!(foreign_keys_enabled(&conn));
    }

    #[test]
    fn test_file_provider_missing_database_is_connectivity_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            FileConnectionProvider::new(DatabaseConfig::in_path(dir.path().join("absent.db")))
                .unwrap();

        let err = match provider.get_connection() {
            Err(err) => err,
            Ok(_) => panic!("missing database file must not open"),
        };

        assert!(matches!(err, DataAccessError::Connectivity { .. }));
        let cause = std::error::Error::source(&err).expect("underlying cause kept");
        assert!(cause.downcast_ref::<rusqlite::Error>().is_some());
        assert!(!dir.path().join("absent.db").exists());
    }
}

// src/lib.rs
// MovieDB - data access for movies and their genres
//
// Architecture:
// - Domain: plain Movie / Genre values
// - Repositories: row <-> entity mapping over bound SQL
// - Db: configuration, connection providers, schema bootstrap
// - Error: one typed error for every data-access failure

pub mod db;
pub mod domain;
pub mod error;
pub mod repositories;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{Genre, Movie};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{DataAccessError, DataResult};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{
    create_connection_pool, initialize_schema, ConnectionPool, ConnectionProvider,
    DatabaseConfig, FileConnectionProvider, PooledConnectionProvider, ScopedConnection,
};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{GenreMatch, MovieRepository, SqliteMovieRepository};

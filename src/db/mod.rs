// src/db/mod.rs
//
// Database module
//
// Provides:
// - Configuration
// - Connection providers (pooled and per-call)
// - Schema bootstrap

pub mod config;
pub mod connection;
pub mod schema;

pub use config::DatabaseConfig;

pub use connection::{
    configure_connection, create_connection_pool, create_test_connection, ConnectionPool,
    ConnectionProvider, FileConnectionProvider, PooledConnectionProvider,
    ScopedConnection,
};

pub use schema::initialize_schema;

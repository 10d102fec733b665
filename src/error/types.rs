// src/error/types.rs
use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

/// Every failure the data-access layer can report.
///
/// Nothing is retried or recovered locally: the variant tells the caller
/// whether the store could not be reached (`Connectivity`), refused a
/// statement (`QueryExecution`), returned something that does not fit an
/// entity (`Mapping`), or answered an insert inconsistently
/// (`GenerationFailed`).
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Connectivity error: {context}: {source}")]
    Connectivity {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Query execution error: {0}")]
    QueryExecution(#[source] rusqlite::Error),

    #[error("Mapping error: {0}")]
    Mapping(#[source] rusqlite::Error),

    #[error("Insert succeeded but the store returned no generated identifier")]
    GenerationFailed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataAccessError {
    pub fn connectivity<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DataAccessError::Connectivity {
            context: context.into(),
            source: source.into(),
        }
    }

    /// True when retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DataAccessError::Connectivity { .. } => true,
            DataAccessError::QueryExecution(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            }
            _ => false,
        }
    }
}

impl Serialize for DataAccessError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<rusqlite::Error> for DataAccessError {
    fn from(err: rusqlite::Error) -> Self {
        let cannot_open = matches!(
            err.sqlite_error_code(),
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase)
        );

        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::Utf8Error(_)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::InvalidColumnType(..) => DataAccessError::Mapping(err),
            _ if cannot_open => DataAccessError::connectivity("Store cannot be opened", err),
            other => DataAccessError::QueryExecution(other),
        }
    }
}

impl From<r2d2::Error> for DataAccessError {
    fn from(err: r2d2::Error) -> Self {
        DataAccessError::connectivity("Connection pool unavailable", err)
    }
}

pub type DataResult<T> = Result<T, DataAccessError>;

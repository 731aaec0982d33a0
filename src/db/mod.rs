pub mod repository;
pub mod sqlite;
pub mod store;

pub use sqlite::*;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store not initialized: call initialize() first")]
    NotInitialized,

    #[error("invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("schema migration failed at version {version}: {reason}")]
    SchemaMigrationFailed { version: i64, reason: String },

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
}

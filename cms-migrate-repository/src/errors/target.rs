//! Error types for the target store.
use thiserror::Error;

/// Represents errors that can occur while writing the CMS schema.
#[derive(Debug, Error)]
pub enum TargetStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Unique constraint violated on {table}: {key}")]
    UniqueViolation { table: &'static str, key: String },

    #[error("Row not found in {table}: {id}")]
    NotFound { table: &'static str, id: i32 },
}

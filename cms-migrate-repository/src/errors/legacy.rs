//! Error types for the legacy source.
use thiserror::Error;

/// Represents errors that can occur while reading the legacy schema.
///
/// A missing row is never an error: lookups return `None` or an empty list.
#[derive(Debug, Error)]
pub enum LegacySourceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid table prefix: {0:?}")]
    InvalidTablePrefix(String),
}

//! Error types for the entity migrators.
use cms_migrate_repository::{LegacySourceError, TargetStoreError};
use thiserror::Error;

use crate::errors::MediaError;

/// Errors raised while migrating.
///
/// A `MigrationError` returned from a migrator aborts the run. Migrators
/// catch row-level failures themselves, log them and count them, so only
/// failures that make the whole phase meaningless, such as the phase's legacy
/// reads, reach the orchestrator.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Legacy source error: {0}")]
    LegacySource(#[from] LegacySourceError),

    #[error("Target store error: {0}")]
    TargetStore(#[from] TargetStoreError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

//! Error types for the orchestrator.
use cms_migrate_repository::TargetStoreError;
use thiserror::Error;

use crate::errors::MigrationError;
use crate::summary::Phase;

/// Fatal errors that end a run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid shortcode prefix: {0}")]
    Sanitizer(#[source] regex::Error),

    #[error("Failed to clear target tables: {0}")]
    Clear(#[source] TargetStoreError),

    #[error("Phase {phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: MigrationError,
    },

    #[error("Failed to read target table counts: {0}")]
    Report(#[source] TargetStoreError),
}

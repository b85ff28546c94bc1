//! Error types for the migration binary.
//! Consolidates the errors of configuration, connection setup and the run itself.
use cms_migrate_pipeline::OrchestratorError;
use cms_migrate_repository::{LegacySourceError, TargetStoreError};
use thiserror::Error;

/// Errors raised while reading the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that end the process with a nonzero exit code.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Legacy source error: {0}")]
    LegacySource(#[from] LegacySourceError),

    #[error("Target store error: {0}")]
    TargetStore(#[from] TargetStoreError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

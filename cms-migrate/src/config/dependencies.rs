//! Dependency initialization and wiring for a migration run.
use std::sync::Arc;

use cms_migrate_pipeline::Orchestrator;
use cms_migrate_repository::{MySqlLegacySource, PostgresTargetStore};
use tracing::info;

use crate::config::AppConfig;
use crate::errors::MigrateError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connects both databases, brings the target schema up to date and
    /// builds the orchestrator.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Both connections established
    /// * `Err(MigrateError)` - A connection, the schema migration or the
    ///   pipeline configuration failed
    pub async fn new(config: AppConfig) -> Result<Self, MigrateError> {
        info!(
            legacy_max_connections = config.legacy_max_connections,
            pg_max_connections = config.pg_max_connections,
            "Initializing dependencies"
        );

        let legacy = MySqlLegacySource::connect(
            &config.legacy_database_url,
            config.table_prefix.clone(),
            config.legacy_max_connections,
        )
        .await?;
        info!("Legacy database connection established");

        let target = PostgresTargetStore::connect(&config.database_url, config.pg_max_connections).await?;
        target.run_migrations().await?;
        info!("Target database connection established");

        let orchestrator = Orchestrator::new(Arc::new(legacy), Arc::new(target), config.pipeline)?;
        Ok(Self { orchestrator })
    }
}

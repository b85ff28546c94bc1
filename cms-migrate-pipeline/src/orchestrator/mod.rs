//! This module defines the `Orchestrator`, which clears the target schema and
//! runs every migration phase in dependency order.
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use cms_migrate_repository::{LegacySource, TargetStore};
use cms_migrate_shared::types::TableCount;
use tracing::info;

use crate::config::PipelineConfig;
use crate::errors::OrchestratorError;
use crate::media::MediaPipeline;
use crate::migrators::{
    CommentsMigrator, ContentMigrator, MenusMigrator, MigrationContext, Migrator, SettingsMigrator,
    TaxonomyMigrator, TermRelationshipsMigrator, UsersMigrator,
};
use crate::resolver::IdentityResolver;
use crate::sanitizer::Sanitizer;
use crate::summary::PhaseSummary;

/// Outcome of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One summary per phase, in execution order.
    pub phases: Vec<PhaseSummary>,
    /// Row counts of the target tables after the last phase.
    pub table_counts: Vec<TableCount>,
}

impl RunReport {
    pub fn failed(&self) -> u64 {
        self.phases.iter().map(|phase| phase.failed).sum()
    }
}

/// `Orchestrator` coordinates a single migration run.
///
/// It owns the legacy source, the target store and the run configuration.
/// Each call to [`Orchestrator::run`] starts from an empty target and a fresh
/// identity resolver, so running it twice against the same source leaves the
/// target in the same state.
pub struct Orchestrator {
    legacy: Arc<dyn LegacySource>,
    target: Arc<dyn TargetStore>,
    config: PipelineConfig,
    sanitizer: Sanitizer,
}

impl Orchestrator {
    /// Creates a new `Orchestrator`.
    ///
    /// # Arguments
    ///
    /// * `legacy` - Read-only access to the WordPress schema
    /// * `target` - Write access to the CMS schema
    /// * `config` - Run configuration
    ///
    /// # Returns
    ///
    /// The orchestrator, or `OrchestratorError::Sanitizer` when a configured
    /// shortcode prefix does not yield a valid pattern.
    pub fn new(
        legacy: Arc<dyn LegacySource>,
        target: Arc<dyn TargetStore>,
        config: PipelineConfig,
    ) -> Result<Self, OrchestratorError> {
        let sanitizer = Sanitizer::new(config.shortcode_prefixes.as_slice()).map_err(OrchestratorError::Sanitizer)?;
        Ok(Self {
            legacy,
            target,
            config,
            sanitizer,
        })
    }

    /// The phases of a run, in the order they execute. Each phase only depends
    /// on ids recorded by the phases before it.
    fn phases() -> Vec<Box<dyn Migrator>> {
        vec![
            Box::new(UsersMigrator),
            Box::new(TaxonomyMigrator),
            Box::new(ContentMigrator),
            Box::new(MediaPipeline),
            Box::new(CommentsMigrator),
            Box::new(TermRelationshipsMigrator),
            Box::new(MenusMigrator),
            Box::new(SettingsMigrator),
        ]
    }

    /// Runs the migration end to end.
    ///
    /// The target is cleared first. A phase error ends the run; row-level
    /// failures are only counted in that phase's summary.
    pub async fn run(&self) -> Result<RunReport, OrchestratorError> {
        let started = Instant::now();

        info!("Clearing target tables...");
        self.target.clear_all().await.map_err(OrchestratorError::Clear)?;
        info!("✓ Cleared target tables");

        let mut resolver = IdentityResolver::new();
        let mut ctx = MigrationContext {
            legacy: self.legacy.as_ref(),
            target: self.target.as_ref(),
            resolver: &mut resolver,
            config: &self.config,
            sanitizer: &self.sanitizer,
            now: Utc::now(),
        };

        let mut report = RunReport::default();
        for migrator in Self::phases() {
            let phase = migrator.phase();
            info!(phase = %phase, "Migrating...");
            let summary = migrator
                .migrate(&mut ctx)
                .await
                .map_err(|source| OrchestratorError::Phase { phase, source })?;
            info!(
                phase = %phase,
                created = summary.created,
                updated = summary.updated,
                skipped = summary.skipped,
                failed = summary.failed,
                "✓ Phase complete"
            );
            report.phases.push(summary);
        }

        report.table_counts = self.target.table_counts().await.map_err(OrchestratorError::Report)?;
        for count in &report.table_counts {
            info!(table = %count.table, rows = count.rows, "Table count");
        }
        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            failed = report.failed(),
            "✓ Migration complete"
        );
        Ok(report)
    }
}

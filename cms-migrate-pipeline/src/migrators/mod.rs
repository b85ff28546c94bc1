//! Entity migrators, one per phase.
//!
//! Every migrator follows the same shape: read legacy rows, clean them,
//! resolve related surrogate ids (skipping what cannot be resolved), upsert by
//! natural key, record the mapping and attach meta rows. Legacy read failures
//! end the phase; single-row write failures are logged and counted.
use chrono::{DateTime, Utc};
use cms_migrate_repository::{LegacySource, TargetStore};

use crate::config::PipelineConfig;
use crate::errors::MigrationError;
use crate::resolver::IdentityResolver;
use crate::sanitizer::Sanitizer;
use crate::summary::{Phase, PhaseSummary};

mod comments;
mod content;
mod menus;
mod relationships;
mod settings;
mod taxonomy;
mod users;

pub use comments::CommentsMigrator;
pub use content::ContentMigrator;
pub(crate) use content::content_slug;
pub use menus::MenusMigrator;
pub use relationships::TermRelationshipsMigrator;
pub use settings::SettingsMigrator;
pub use taxonomy::TaxonomyMigrator;
pub use users::UsersMigrator;

/// Everything a migrator needs for one run.
pub struct MigrationContext<'a> {
    pub legacy: &'a dyn LegacySource,
    pub target: &'a dyn TargetStore,
    pub resolver: &'a mut IdentityResolver,
    pub config: &'a PipelineConfig,
    pub sanitizer: &'a Sanitizer,
    /// Substitute for legacy timestamps that cannot be used.
    pub now: DateTime<Utc>,
}

/// A single phase of the migration.
#[async_trait::async_trait]
pub trait Migrator: Send + Sync {
    fn phase(&self) -> Phase;

    /// Runs the phase to completion.
    ///
    /// # Returns
    ///
    /// A summary of the rows written, skipped and failed, or a
    /// `MigrationError` when the legacy source could not be read.
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError>;
}

/// Clamps a legacy integer into the range of a target `INTEGER` column.
pub(crate) fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

use cms_migrate_shared::types::SettingRecord;
use tracing::{instrument, warn};

use crate::errors::MigrationError;
use crate::meta::setting_value;
use crate::migrators::{MigrationContext, Migrator};
use crate::summary::{Phase, PhaseSummary};

const TRANSIENT_PREFIXES: [&str; 2] = ["_transient_", "_site_transient_"];

/// Copies options into settings, decoding JSON and PHP-serialized values.
pub struct SettingsMigrator;

#[async_trait::async_trait]
impl Migrator for SettingsMigrator {
    fn phase(&self) -> Phase {
        Phase::Settings
    }

    #[instrument(skip_all, fields(phase = "settings"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Settings);

        for option in ctx.legacy.find_options().await? {
            if ctx.config.skip_transient_options && is_transient(&option.name) {
                summary.skip();
                continue;
            }
            let setting = SettingRecord {
                key: option.name.replace('\u{0}', ""),
                value: setting_value(&option.value),
            };
            match ctx.target.upsert_setting(&setting).await {
                Ok(upserted) => summary.record(upserted),
                Err(e) => {
                    warn!(legacy_id = option.id, family = "settings", key = %option.name, reason = %e, "Failed to migrate setting");
                    summary.fail();
                }
            }
        }

        Ok(summary)
    }
}

fn is_transient(name: &str) -> bool {
    TRANSIENT_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transients() {
        assert!(is_transient("_transient_timeout_feed"));
        assert!(is_transient("_site_transient_update_core"));
        assert!(!is_transient("blogname"));
    }
}

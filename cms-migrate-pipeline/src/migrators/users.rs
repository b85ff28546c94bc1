use cms_migrate_shared::types::{LegacyUser, UserRecord};
use tracing::{debug, instrument, warn};

use crate::config::PipelineConfig;
use crate::dates::normalize_timestamp;
use crate::errors::MigrationError;
use crate::meta::meta_entries;
use crate::migrators::{MigrationContext, Migrator};
use crate::resolver::EntityFamily;
use crate::summary::{Phase, PhaseSummary};

/// Migrates users by email, with their meta rows.
pub struct UsersMigrator;

#[async_trait::async_trait]
impl Migrator for UsersMigrator {
    fn phase(&self) -> Phase {
        Phase::Users
    }

    #[instrument(skip_all, fields(phase = "users"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Users);

        for user in ctx.legacy.find_users().await? {
            let meta_rows = ctx.legacy.find_user_meta(user.id).await?;
            let record = user_record(&user, ctx.config, ctx.now);
            let meta = meta_entries(&meta_rows);

            match ctx.target.persist_user(&record, &meta).await {
                Ok(upserted) => {
                    debug!(legacy_id = user.id, id = upserted.id, email = %record.email, "User migrated");
                    ctx.resolver.record(EntityFamily::Users, user.id, upserted.id);
                    summary.record(upserted);
                }
                Err(e) => {
                    warn!(legacy_id = user.id, family = "users", reason = %e, "Failed to migrate user");
                    summary.fail();
                }
            }
        }

        Ok(summary)
    }
}

fn user_record(
    user: &LegacyUser,
    config: &PipelineConfig,
    now: chrono::DateTime<chrono::Utc>,
) -> UserRecord {
    let email = match user.email.trim() {
        "" => format!("user-{}@{}", user.id, config.placeholder_email_domain),
        email => email.to_string(),
    };
    let display_name = match user.display_name.trim() {
        "" => user.login.clone(),
        name => name.to_string(),
    };

    UserRecord {
        login: user.login.clone(),
        email,
        password_hash: user.password_hash.clone(),
        display_name,
        role: config.roles.role_for(user.id),
        is_active: user.status == 0,
        registered_at: normalize_timestamp(user.registered_at.as_deref(), now),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use cms_migrate_shared::types::UserRole;

    use super::*;

    #[test]
    fn test_user_record_fallbacks() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let user = LegacyUser {
            id: 7,
            login: "jdoe".to_string(),
            email: "  ".to_string(),
            status: 1,
            registered_at: Some("0000-00-00 00:00:00".to_string()),
            ..Default::default()
        };

        let record = user_record(&user, &PipelineConfig::default(), now);
        assert_eq!(record.email, "user-7@example.local");
        assert_eq!(record.display_name, "jdoe");
        assert_eq!(record.role, UserRole::Author);
        assert!(!record.is_active);
        assert_eq!(record.registered_at, now);
    }

    #[test]
    fn test_first_user_is_superadmin() {
        let user = LegacyUser {
            id: 1,
            email: "admin@site.test".to_string(),
            ..Default::default()
        };
        let record = user_record(&user, &PipelineConfig::default(), Utc::now());
        assert_eq!(record.role, UserRole::Superadmin);
        assert!(record.is_active);
    }
}

//! Featured-image relinking.
use cms_migrate_shared::types::{LegacyId, MetaEntry, TargetId};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::errors::MigrationError;
use crate::media::AttachmentIndex;
use crate::migrators::MigrationContext;
use crate::resolver::EntityFamily;
use crate::summary::PhaseSummary;

pub const THUMBNAIL_KEY: &str = "_thumbnail_id";
pub const FEATURED_IMAGE_KEY: &str = "featured_image";

/// Writes a `featured_image` meta row for every migrated content item that
/// carries a legacy `_thumbnail_id`. Items whose image cannot be found keep
/// the row with a null media id.
pub(crate) async fn link_featured_images(
    ctx: &MigrationContext<'_>,
    index: &AttachmentIndex<'_>,
    summary: &mut PhaseSummary,
) -> Result<(), MigrationError> {
    let mut linked = 0u64;
    let mut unresolved = 0u64;

    for row in ctx.legacy.find_post_meta_by_key(THUMBNAIL_KEY).await? {
        let Some(content) = ctx.resolver.lookup_content(row.owner_id) else {
            debug!(legacy_id = row.owner_id, "Thumbnail owner was not migrated");
            continue;
        };
        let Some(attachment_id) = row
            .value
            .as_deref()
            .and_then(|value| value.trim().parse::<LegacyId>().ok())
        else {
            warn!(legacy_id = row.owner_id, family = "media", reason = "invalid attachment id", "Skipping featured image");
            summary.skip();
            continue;
        };

        let attached_path = index
            .by_id(attachment_id)
            .and_then(|attachment| attachment.attached_file.as_deref())
            .map(|file| ctx.config.media.public_path(file));
        let media_id = resolve_media(ctx, attachment_id, attached_path.as_deref()).await?;
        match media_id {
            Some(_) => linked += 1,
            None => {
                warn!(
                    legacy_id = row.owner_id,
                    attachment_id,
                    family = "media",
                    reason = "unresolved",
                    "Featured image not found"
                );
                unresolved += 1;
            }
        }

        let entry = MetaEntry::new(
            FEATURED_IMAGE_KEY,
            json!({ "wp_attachment_id": attachment_id, "path": attached_path }),
        )
        .with_media(media_id);
        match ctx.target.upsert_content_meta(content, &entry).await {
            Ok(upserted) => summary.record(upserted),
            Err(e) => {
                warn!(legacy_id = row.owner_id, family = "media", reason = %e, "Failed to write featured image");
                summary.fail();
            }
        }
    }

    info!(linked, unresolved, "Relinked featured images");
    Ok(())
}

/// Attachment id, then normalized path, then filename, then file stem.
async fn resolve_media(
    ctx: &MigrationContext<'_>,
    attachment_id: LegacyId,
    attached_path: Option<&str>,
) -> Result<Option<TargetId>, MigrationError> {
    if let Some(id) = ctx.resolver.lookup(EntityFamily::Media, attachment_id) {
        return Ok(Some(id));
    }
    if let Ok(attachment_id) = i64::try_from(attachment_id) {
        if let Some(id) = ctx.target.find_media_by_attachment_id(attachment_id).await? {
            return Ok(Some(id));
        }
    }
    let Some(path) = attached_path else {
        return Ok(None);
    };

    let normalized = normalized_path(path, ctx.config.media.output_format.extension());
    for candidate in [Some(path.to_string()), normalized].into_iter().flatten() {
        if let Some(id) = ctx.target.find_media_by_path(&candidate).await? {
            return Ok(Some(id));
        }
    }

    let filename = path.rsplit('/').next().unwrap_or(path);
    if let Some(id) = ctx.target.find_media_by_filename(&format!("/{filename}")).await? {
        return Ok(Some(id));
    }
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => {
            Ok(ctx.target.find_media_by_filename(&format!("/{stem}.")).await?)
        }
        _ => Ok(None),
    }
}

/// The path the converted copy of `path` would have.
fn normalized_path(path: &str, extension: &str) -> Option<String> {
    let (stem, current) = path.rsplit_once('.')?;
    if current.eq_ignore_ascii_case(extension) || current.contains('/') || stem.ends_with('/') {
        return None;
    }
    Some(format!("{stem}.{extension}"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cms_migrate_repository::mock::{LegacySnapshot, MockLegacySource, MockTargetStore};
    use cms_migrate_shared::types::MediaRecord;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::resolver::IdentityResolver;
    use crate::sanitizer::Sanitizer;

    fn media(path: &str) -> MediaRecord {
        MediaRecord {
            filename: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            mime_type: "image/jpeg".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_filename_match_is_anchored_at_a_path_segment() {
        let legacy = MockLegacySource::new(LegacySnapshot::default());
        let target = MockTargetStore::new();
        let banana = target.seed_media(media("/uploads/2020/banana.jpg"));
        let mut resolver = IdentityResolver::new();
        let config = PipelineConfig::default();
        let sanitizer = Sanitizer::default();
        let ctx = MigrationContext {
            legacy: &legacy,
            target: &target,
            resolver: &mut resolver,
            config: &config,
            sanitizer: &sanitizer,
            now: Utc::now(),
        };

        assert_eq!(resolve_media(&ctx, 99, Some("/uploads/old/a.jpg")).await.unwrap(), None);
        assert_eq!(
            resolve_media(&ctx, 99, Some("/uploads/old/banana.jpg")).await.unwrap(),
            Some(banana)
        );
    }

    #[test]
    fn test_normalized_path() {
        assert_eq!(
            normalized_path("/uploads/2021/05/a.jpg", "webp"),
            Some("/uploads/2021/05/a.webp".to_string())
        );
        assert_eq!(normalized_path("/uploads/a.webp", "webp"), None);
        assert_eq!(normalized_path("/uploads/noext", "webp"), None);
    }
}

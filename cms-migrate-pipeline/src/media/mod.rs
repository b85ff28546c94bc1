//! Media pipeline: discovery, optional conversion, canonical `Media` and
//! `MediaSize` rows, and featured-image relinking.
//!
//! Files are processed one group at a time. A group that fails (unreadable
//! file, undecodable image, rejected write) is logged and counted and the
//! batch moves on.
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use cms_migrate_shared::types::{LegacyAttachment, LegacyId, MediaRecord, MediaSizeRecord, TargetId};
use tracing::{debug, info, instrument, warn};

use crate::config::MediaConfig;
use crate::errors::{MediaError, MigrationError};
use crate::migrators::{MigrationContext, Migrator};
use crate::resolver::EntityFamily;
use crate::summary::{Phase, PhaseSummary};

pub mod convert;
pub mod discovery;
mod relink;

pub use relink::{FEATURED_IMAGE_KEY, THUMBNAIL_KEY};

use convert::{Encoding, WrittenFile};
use discovery::{AssetGroup, VariantSize, extension_of, is_raster, mime_for_extension, numeric_suffix, preferred};

/// Source formats that are re-encoded when originals are normalized.
const CONVERTIBLE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const FALLBACK_MIME: &str = "application/octet-stream";

/// Legacy attachments keyed by id and by their uploads-relative file.
pub struct AttachmentIndex<'a> {
    by_id: HashMap<LegacyId, &'a LegacyAttachment>,
    by_file: HashMap<String, &'a LegacyAttachment>,
}

impl<'a> AttachmentIndex<'a> {
    pub fn new(attachments: &'a [LegacyAttachment]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_file = HashMap::new();
        for attachment in attachments {
            by_id.insert(attachment.id, attachment);
            if let Some(file) = attachment.attached_file.as_deref() {
                by_file.entry(normalize_relative(file)).or_insert(attachment);
            }
        }
        Self { by_id, by_file }
    }

    pub fn by_id(&self, id: LegacyId) -> Option<&'a LegacyAttachment> {
        self.by_id.get(&id).copied()
    }

    pub fn by_file(&self, relative: &str) -> Option<&'a LegacyAttachment> {
        self.by_file.get(&normalize_relative(relative)).copied()
    }
}

fn normalize_relative(path: &str) -> String {
    path.trim().replace('\\', "/").trim_start_matches('/').to_string()
}

/// Path of `path` below `root`, with `/` separators.
fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

async fn blocking<T, F>(task: F) -> Result<T, MediaError>
where
    F: FnOnce() -> Result<T, MediaError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

/// Runs the media phase.
pub struct MediaPipeline;

#[async_trait::async_trait]
impl Migrator for MediaPipeline {
    fn phase(&self) -> Phase {
        Phase::Media
    }

    #[instrument(skip_all, fields(phase = "media"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Media);
        let attachments = ctx.legacy.find_attachments().await?;
        let index = AttachmentIndex::new(&attachments);
        let config = ctx.config;
        let media = &config.media;

        let groups = if media.root.is_dir() {
            let root = media.root.clone();
            let names: Vec<String> = media.named_sizes.iter().map(|size| size.name.clone()).collect();
            match tokio::task::spawn_blocking(move || discovery::discover(&root, &names)).await {
                Ok(groups) => groups,
                Err(e) => {
                    warn!(root = %media.root.display(), reason = %e, "Media discovery failed");
                    Vec::new()
                }
            }
        } else {
            warn!(root = %media.root.display(), "Media root not found, skipping file discovery");
            Vec::new()
        };
        info!(groups = groups.len(), attachments = attachments.len(), "Discovered media");

        let mut bytes_freed = 0u64;
        for group in groups {
            let label = group.directory.join(&group.base);
            match canonicalize_group(ctx, &index, group, &mut summary).await {
                Ok(freed) => bytes_freed += freed,
                Err(e) => {
                    warn!(file = %label.display(), family = "media", reason = %e, "Failed to migrate media group");
                    summary.fail();
                }
            }
        }

        catalog_unlocated(ctx, &attachments, &mut summary).await;
        relink::link_featured_images(ctx, &index, &mut summary).await?;

        if media.remove_superseded {
            info!(bytes_freed, "Removed superseded source files");
        }
        Ok(summary)
    }
}

/// Converts what is configured, then writes the group's `Media` row and one
/// `MediaSize` per variant.
///
/// # Returns
///
/// Bytes freed by superseded-source cleanup.
async fn canonicalize_group(
    ctx: &mut MigrationContext<'_>,
    index: &AttachmentIndex<'_>,
    mut group: AssetGroup,
    summary: &mut PhaseSummary,
) -> Result<u64, MigrationError> {
    let pipeline = ctx.config;
    let config = &pipeline.media;
    let encoding = Encoding {
        format: config.output_format,
        quality: config.quality,
    };
    let extension = encoding.format.extension();

    let Some(source) = group.canonical_original(extension).cloned() else {
        debug!(directory = %group.directory.display(), base = %group.base, "Variants without an original");
        summary.skip();
        return Ok(0);
    };

    if config.convert_originals && is_convertible(&source, extension) {
        let target = source.with_extension(extension);
        let (from, to) = (source.clone(), target.clone());
        let (max_width, max_height) = (config.max_width, config.max_height);
        match blocking(move || convert::fit_inside(&from, &to, max_width, max_height, encoding)).await {
            Ok(written) => {
                debug!(file = %written.path.display(), "Normalized original");
                if !group.originals.contains(&target) {
                    group.originals.push(target);
                }
            }
            Err(e) => {
                warn!(file = %source.display(), family = "media", reason = %e, "Failed to normalize original");
                summary.fail();
            }
        }
    }

    if config.generate_variants && is_raster(&source) {
        generate_missing_sizes(config, &mut group, &source, encoding, summary).await;
    }

    let canonical = group
        .canonical_original(extension)
        .cloned()
        .unwrap_or(source);
    let facts = {
        let path = canonical.clone();
        blocking(move || convert::inspect(&path)).await?
    };
    let Some(relative) = relative_to(&config.root, &canonical) else {
        summary.skip();
        return Ok(0);
    };

    let attachment = group
        .originals
        .iter()
        .filter_map(|path| relative_to(&config.root, path))
        .find_map(|relative| index.by_file(&relative))
        .or_else(|| {
            canonical
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(numeric_suffix)
                .and_then(|id| index.by_id(id))
        });

    let record = media_record(config, &canonical, &relative, &facts, attachment);
    let upserted = ctx.target.upsert_media(&record).await?;
    if let Some(attachment) = attachment {
        ctx.resolver.record(EntityFamily::Media, attachment.id, upserted.id);
    }
    summary.record(upserted);

    for (size, paths) in &group.variants {
        let Some(path) = preferred(paths, extension).cloned() else {
            continue;
        };
        if let Err(e) = write_size(ctx, upserted.id, size, &path, summary).await {
            warn!(file = %path.display(), family = "media_sizes", reason = %e, "Failed to migrate media size");
            summary.fail();
        }
    }

    if !config.remove_superseded {
        return Ok(0);
    }
    let mut freed = 0;
    let files: Vec<PathBuf> = group
        .originals
        .iter()
        .chain(group.variants.values().flatten())
        .cloned()
        .collect();
    for file in files {
        let path = file.clone();
        match blocking(move || convert::remove_if_superseded(&path, extension)).await {
            Ok(bytes) => freed += bytes,
            Err(e) => warn!(file = %file.display(), reason = %e, "Failed to remove superseded file"),
        }
    }
    Ok(freed)
}

async fn generate_missing_sizes(
    config: &MediaConfig,
    group: &mut AssetGroup,
    source: &Path,
    encoding: Encoding,
    summary: &mut PhaseSummary,
) {
    for size in &config.named_sizes {
        if group.has_variant_named(&size.name) {
            continue;
        }
        let target = group
            .directory
            .join(format!("{}-{}.{}", group.base, size.name, encoding.format.extension()));
        let (from, to) = (source.to_path_buf(), target.clone());
        let (width, height) = (size.width, size.height);
        match blocking(move || convert::resize_to_fill(&from, &to, width, height, encoding)).await {
            Ok(written) => {
                debug!(file = %written.path.display(), size = %size.name, "Generated size");
                group
                    .variants
                    .entry(VariantSize::Named(size.name.clone()))
                    .or_default()
                    .push(target);
            }
            Err(e) => {
                warn!(file = %source.display(), size = %size.name, family = "media_sizes", reason = %e, "Failed to generate size");
                summary.fail();
            }
        }
    }
}

async fn write_size(
    ctx: &MigrationContext<'_>,
    media_id: TargetId,
    size: &VariantSize,
    path: &Path,
    summary: &mut PhaseSummary,
) -> Result<(), MigrationError> {
    let config = &ctx.config.media;
    let Some(relative) = relative_to(&config.root, path) else {
        return Ok(());
    };
    let bytes = {
        let path = path.to_path_buf();
        blocking(move || std::fs::metadata(&path).map(|m| m.len()).map_err(|e| MediaError::io(&path, e))).await?
    };
    let (width, height) = match size {
        VariantSize::Named(name) => config
            .named_size(name)
            .map(|named| (named.width, named.height))
            .unwrap_or((0, 0)),
        VariantSize::Dimensions(width, height) => (*width, *height),
    };

    let record = MediaSizeRecord {
        media_id,
        name: size.name(),
        path: config.public_path(&relative),
        width: dimension(width),
        height: dimension(height),
        file_size: i64::try_from(bytes).unwrap_or(i64::MAX),
    };
    summary.record(ctx.target.upsert_media_size(&record).await?);
    Ok(())
}

fn media_record(
    config: &MediaConfig,
    canonical: &Path,
    relative: &str,
    facts: &WrittenFile,
    attachment: Option<&LegacyAttachment>,
) -> MediaRecord {
    let filename = canonical
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(relative)
        .to_string();
    let mime_type = extension_of(canonical)
        .and_then(|ext| mime_for_extension(&ext))
        .unwrap_or(FALLBACK_MIME)
        .to_string();

    MediaRecord {
        filename,
        path: config.public_path(relative),
        mime_type,
        file_size: i64::try_from(facts.bytes).unwrap_or(i64::MAX),
        width: dimension(facts.width),
        height: dimension(facts.height),
        wp_attachment_id: attachment.and_then(|a| i64::try_from(a.id).ok()),
        alt: attachment.and_then(|a| non_empty(a.alt.as_deref())),
        title: attachment.and_then(|a| non_empty(Some(a.title.as_str()))),
        caption: attachment.and_then(|a| non_empty(Some(a.caption.as_str()))),
    }
}

/// Registers attachments known to the legacy database whose file was not
/// found on disk, so featured images can still point at them.
async fn catalog_unlocated(
    ctx: &mut MigrationContext<'_>,
    attachments: &[LegacyAttachment],
    summary: &mut PhaseSummary,
) {
    let mut registered = 0u64;

    for attachment in attachments {
        if ctx.resolver.lookup(EntityFamily::Media, attachment.id).is_some() {
            continue;
        }
        let Some(file) = attachment.attached_file.as_deref().map(normalize_relative) else {
            continue;
        };
        if file.is_empty() {
            continue;
        }
        let filename = file.rsplit('/').next().unwrap_or(&file).to_string();
        let mime_type = non_empty(Some(attachment.mime_type.as_str()))
            .or_else(|| {
                filename
                    .rsplit_once('.')
                    .and_then(|(_, ext)| mime_for_extension(ext))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let record = MediaRecord {
            path: ctx.config.media.public_path(&file),
            filename,
            mime_type,
            file_size: 0,
            width: None,
            height: None,
            wp_attachment_id: i64::try_from(attachment.id).ok(),
            alt: non_empty(attachment.alt.as_deref()),
            title: non_empty(Some(attachment.title.as_str())),
            caption: non_empty(Some(attachment.caption.as_str())),
        };
        match ctx.target.upsert_media(&record).await {
            Ok(upserted) => {
                ctx.resolver.record(EntityFamily::Media, attachment.id, upserted.id);
                summary.record(upserted);
                registered += 1;
            }
            Err(e) => {
                warn!(legacy_id = attachment.id, family = "media", reason = %e, "Failed to register attachment");
                summary.fail();
            }
        }
    }

    if registered > 0 {
        info!(registered, "Registered attachments without a file on disk");
    }
}

fn is_convertible(path: &Path, output_extension: &str) -> bool {
    extension_of(path).is_some_and(|ext| {
        ext != output_extension && CONVERTIBLE_EXTENSIONS.contains(&ext.as_str())
    })
}

fn dimension(value: u32) -> Option<i32> {
    (value > 0).then(|| i32::try_from(value).unwrap_or(i32::MAX))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to_uses_forward_slashes() {
        let root = PathBuf::from("/srv/uploads");
        assert_eq!(
            relative_to(&root, &root.join("2021").join("05").join("a.jpg")),
            Some("2021/05/a.jpg".to_string())
        );
        assert_eq!(relative_to(&root, Path::new("/elsewhere/a.jpg")), None);
    }

    #[test]
    fn test_attachment_index_normalizes_files() {
        let attachments = vec![LegacyAttachment {
            id: 5,
            attached_file: Some("/2021/05/a.jpg".to_string()),
            ..Default::default()
        }];
        let index = AttachmentIndex::new(&attachments);
        assert_eq!(index.by_file("2021/05/a.jpg").map(|a| a.id), Some(5));
        assert_eq!(index.by_id(5).map(|a| a.id), Some(5));
        assert!(index.by_file("2021/05/b.jpg").is_none());
    }

    #[test]
    fn test_is_convertible() {
        assert!(is_convertible(Path::new("a.JPG"), "webp"));
        assert!(!is_convertible(Path::new("a.webp"), "webp"));
        assert!(!is_convertible(Path::new("a.gif"), "webp"));
        assert!(!is_convertible(Path::new("a.png"), "png"));
    }
}

//! Run-time options of the migration pipeline.
//!
//! These are plain values; reading them from the environment is the binary's
//! job.
use std::collections::BTreeMap;
use std::path::PathBuf;

use cms_migrate_shared::types::{ContentFamily, LegacyId, UserRole};

use crate::sanitizer::DEFAULT_SHORTCODE_PREFIXES;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Locale of the single translation seeded per content item.
    pub default_language: String,
    /// Legacy `post_type` tag → content family.
    pub content_types: BTreeMap<String, ContentFamily>,
    /// Legacy statuses that are never migrated.
    pub excluded_statuses: Vec<String>,
    /// Skip posts with a blank slug instead of assigning `post-<id>`.
    pub skip_blank_slugs: bool,
    pub roles: RoleMapping,
    pub placeholder_email_domain: String,
    pub shortcode_prefixes: Vec<String>,
    pub skip_transient_options: bool,
    pub media: MediaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let content_types = [
            ("page", ContentFamily::Page),
            ("post", ContentFamily::Article),
            ("portfolio", ContentFamily::Portfolio),
            ("avada_portfolio", ContentFamily::Portfolio),
            ("product", ContentFamily::Product),
        ]
        .into_iter()
        .map(|(tag, family)| (tag.to_string(), family))
        .collect();

        Self {
            default_language: "de".to_string(),
            content_types,
            excluded_statuses: ["auto-draft", "trash", "inherit"]
                .into_iter()
                .map(String::from)
                .collect(),
            skip_blank_slugs: false,
            roles: RoleMapping::default(),
            placeholder_email_domain: "example.local".to_string(),
            shortcode_prefixes: DEFAULT_SHORTCODE_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            skip_transient_options: true,
            media: MediaConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn family_of(&self, post_type: &str) -> Option<ContentFamily> {
        self.content_types.get(post_type).copied()
    }

    /// Every legacy type tag that maps to a content family.
    pub fn content_post_types(&self) -> Vec<String> {
        self.content_types.keys().cloned().collect()
    }

    pub fn is_excluded_status(&self, status: &str) -> bool {
        self.excluded_statuses.iter().any(|s| s == status)
    }
}

/// Legacy user id → role table with a fallback role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    pub by_legacy_id: BTreeMap<LegacyId, UserRole>,
    pub default_role: UserRole,
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self {
            by_legacy_id: BTreeMap::from([(1, UserRole::Superadmin)]),
            default_role: UserRole::Author,
        }
    }
}

impl RoleMapping {
    pub fn role_for(&self, legacy_id: LegacyId) -> UserRole {
        self.by_legacy_id
            .get(&legacy_id)
            .copied()
            .unwrap_or(self.default_role)
    }
}

/// A named derived size, e.g. `thumbnail` at 300×300.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSize {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl NamedSize {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// Encoding used for generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Parses `webp`, `jpeg`/`jpg` or `png`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "webp" => Some(OutputFormat::WebP),
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory scanned for assets; generated files are written beside their source.
    pub root: PathBuf,
    /// URL prefix prepended to paths relative to `root`.
    pub public_prefix: String,
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    pub named_sizes: Vec<NamedSize>,
    pub output_format: OutputFormat,
    pub generate_variants: bool,
    pub convert_originals: bool,
    pub remove_superseded: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./public/uploads"),
            public_prefix: "/uploads".to_string(),
            quality: 85,
            max_width: 1920,
            max_height: 1080,
            named_sizes: vec![
                NamedSize::new("thumbnail", 300, 300),
                NamedSize::new("medium", 768, 768),
                NamedSize::new("large", 1200, 1200),
            ],
            output_format: OutputFormat::WebP,
            generate_variants: false,
            convert_originals: false,
            remove_superseded: false,
        }
    }
}

impl MediaConfig {
    pub fn named_size(&self, name: &str) -> Option<&NamedSize> {
        self.named_sizes.iter().find(|size| size.name == name)
    }

    /// Joins the public prefix and a root-relative path with exactly one slash.
    pub fn public_path(&self, relative: &str) -> String {
        let prefix = self.public_prefix.trim_end_matches('/');
        let relative = relative.trim_start_matches('/');
        format!("{prefix}/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_type_tags() {
        let config = PipelineConfig::default();
        assert_eq!(config.family_of("post"), Some(ContentFamily::Article));
        assert_eq!(config.family_of("avada_portfolio"), Some(ContentFamily::Portfolio));
        assert_eq!(config.family_of("attachment"), None);
        assert_eq!(config.family_of("portfolio"), Some(ContentFamily::Portfolio));
        assert!(config.is_excluded_status("auto-draft"));
        assert!(!config.is_excluded_status("publish"));
    }

    #[test]
    fn test_role_mapping_falls_back() {
        let roles = RoleMapping::default();
        assert_eq!(roles.role_for(1), UserRole::Superadmin);
        assert_eq!(roles.role_for(2), UserRole::Author);
    }

    #[test]
    fn test_public_path_normalizes_slashes() {
        let mut media = MediaConfig::default();
        assert_eq!(media.public_path("2021/05/a.jpg"), "/uploads/2021/05/a.jpg");
        media.public_prefix = "/uploads/".to_string();
        assert_eq!(media.public_path("/a.jpg"), "/uploads/a.jpg");
    }
}

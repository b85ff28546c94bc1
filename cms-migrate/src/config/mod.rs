//! Configuration module for the migration binary.
//! Reads the process environment into an `AppConfig` and wires the
//! dependencies of a run.
mod dependencies;

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use cms_migrate_pipeline::{MediaConfig, NamedSize, OutputFormat, PipelineConfig, RoleMapping};
use cms_migrate_shared::types::{LegacyId, UserRole};
use tracing::info;

use crate::errors::ConfigError;

pub use dependencies::Dependencies;

/// Default WordPress table prefix.
const DEFAULT_TABLE_PREFIX: &str = "wp_";

/// Default size of each connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Settings of one run, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub legacy_database_url: String,
    pub database_url: String,
    pub table_prefix: String,
    pub legacy_max_connections: u32,
    pub pg_max_connections: u32,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Reads the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LEGACY_DATABASE_URL`: MySQL URL of the WordPress database (required)
    /// - `DATABASE_URL`: PostgreSQL URL of the CMS database (required)
    /// - `LEGACY_TABLE_PREFIX` or `DB_PREFIX`: WordPress table prefix (default: wp_)
    /// - `LEGACY_MAX_CONNECTIONS` / `PG_MAX_CONNECTIONS`: pool sizes (default: 5)
    /// - `DEFAULT_LANGUAGE`: locale of the seeded translation (default: de)
    /// - `USER_ROLE_MAP`: `id=ROLE` pairs separated by commas (default: 1=SUPERADMIN)
    /// - `DEFAULT_USER_ROLE`: role of unmapped users (default: AUTHOR)
    /// - `PLACEHOLDER_EMAIL_DOMAIN`: domain of generated emails (default: example.local)
    /// - `SHORTCODE_PREFIXES`: builder shortcode prefixes, comma separated (default: fusion_)
    /// - `SKIP_TRANSIENT_OPTIONS`: skip cached options (default: true)
    /// - `MEDIA_ROOT`, `MEDIA_PUBLIC_PREFIX`, `MEDIA_QUALITY`, `MEDIA_MAX_WIDTH`,
    ///   `MEDIA_MAX_HEIGHT`, `MEDIA_SIZE_THUMBNAIL`, `MEDIA_SIZE_MEDIUM`,
    ///   `MEDIA_SIZE_LARGE`, `MEDIA_OUTPUT_FORMAT`, `MEDIA_GENERATE_VARIANTS`,
    ///   `MEDIA_CONVERT_ORIGINALS`, `MEDIA_REMOVE_SUPERSEDED`: media pipeline settings
    ///
    /// # Returns
    ///
    /// * `Ok(AppConfig)` - Every variable present and valid
    /// * `Err(ConfigError)` - A required variable is missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let legacy_database_url = required("LEGACY_DATABASE_URL")?;
        let database_url = required("DATABASE_URL")?;
        let table_prefix = optional("LEGACY_TABLE_PREFIX")
            .or_else(|| optional("DB_PREFIX"))
            .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        let legacy_max_connections = parsed("LEGACY_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let pg_max_connections = parsed("PG_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            default_language: optional("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
            roles: role_mapping()?,
            placeholder_email_domain: optional("PLACEHOLDER_EMAIL_DOMAIN")
                .unwrap_or(defaults.placeholder_email_domain),
            shortcode_prefixes: optional("SHORTCODE_PREFIXES")
                .map(|value| split_list(&value))
                .unwrap_or(defaults.shortcode_prefixes),
            skip_transient_options: flag("SKIP_TRANSIENT_OPTIONS", defaults.skip_transient_options)?,
            media: media_config()?,
            ..defaults
        };

        info!(
            table_prefix = %table_prefix,
            default_language = %pipeline.default_language,
            media_root = %pipeline.media.root.display(),
            output_format = pipeline.media.output_format.extension(),
            generate_variants = pipeline.media.generate_variants,
            "Configuration loaded"
        );

        Ok(Self {
            legacy_database_url,
            database_url,
            table_prefix,
            legacy_max_connections,
            pg_max_connections,
            pipeline,
        })
    }
}

fn media_config() -> Result<MediaConfig, ConfigError> {
    let defaults = MediaConfig::default();
    let quality: u8 = parsed("MEDIA_QUALITY", defaults.quality)?;
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::invalid("MEDIA_QUALITY", quality.to_string(), "expected 1-100"));
    }
    let output_format = match optional("MEDIA_OUTPUT_FORMAT") {
        Some(value) => OutputFormat::parse(&value)
            .ok_or_else(|| ConfigError::invalid("MEDIA_OUTPUT_FORMAT", value, "expected webp, jpeg or png"))?,
        None => defaults.output_format,
    };

    let mut named_sizes = Vec::with_capacity(defaults.named_sizes.len());
    for size in &defaults.named_sizes {
        let var = match size.name.as_str() {
            "thumbnail" => "MEDIA_SIZE_THUMBNAIL",
            "medium" => "MEDIA_SIZE_MEDIUM",
            "large" => "MEDIA_SIZE_LARGE",
            _ => {
                named_sizes.push(size.clone());
                continue;
            }
        };
        named_sizes.push(match optional(var) {
            Some(value) => {
                let (width, height) = parse_dimensions(&value).ok_or_else(|| {
                    ConfigError::invalid(var, value.clone(), "expected <width>x<height>")
                })?;
                NamedSize::new(size.name.clone(), width, height)
            }
            None => size.clone(),
        });
    }

    Ok(MediaConfig {
        root: optional("MEDIA_ROOT").map(PathBuf::from).unwrap_or(defaults.root),
        public_prefix: optional("MEDIA_PUBLIC_PREFIX").unwrap_or(defaults.public_prefix),
        quality,
        max_width: parsed("MEDIA_MAX_WIDTH", defaults.max_width)?,
        max_height: parsed("MEDIA_MAX_HEIGHT", defaults.max_height)?,
        named_sizes,
        output_format,
        generate_variants: flag("MEDIA_GENERATE_VARIANTS", defaults.generate_variants)?,
        convert_originals: flag("MEDIA_CONVERT_ORIGINALS", defaults.convert_originals)?,
        remove_superseded: flag("MEDIA_REMOVE_SUPERSEDED", defaults.remove_superseded)?,
    })
}

fn role_mapping() -> Result<RoleMapping, ConfigError> {
    let defaults = RoleMapping::default();
    let default_role = match optional("DEFAULT_USER_ROLE") {
        Some(value) => UserRole::from_str(&value)
            .map_err(|e| ConfigError::invalid("DEFAULT_USER_ROLE", value.clone(), e.to_string()))?,
        None => defaults.default_role,
    };
    let by_legacy_id = match optional("USER_ROLE_MAP") {
        Some(value) => parse_role_map(&value)
            .map_err(|reason| ConfigError::invalid("USER_ROLE_MAP", value.clone(), reason))?,
        None => defaults.by_legacy_id,
    };
    Ok(RoleMapping {
        by_legacy_id,
        default_role,
    })
}

/// Parses `1=SUPERADMIN, 7=editor` into a role table.
fn parse_role_map(value: &str) -> Result<BTreeMap<LegacyId, UserRole>, String> {
    let mut roles = BTreeMap::new();
    for pair in split_list(value) {
        let (id, role) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected id=ROLE, got {pair:?}"))?;
        let id = id
            .trim()
            .parse::<LegacyId>()
            .map_err(|_| format!("invalid user id {:?}", id.trim()))?;
        let role = role.parse::<UserRole>().map_err(|e| e.to_string())?;
        roles.insert(id, role);
    }
    Ok(roles)
}

/// Parses `300x200` into (width, height). Zero is rejected.
fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.trim().split_once(['x', 'X'])?;
    let width = width.trim().parse().ok().filter(|w: &u32| *w > 0)?;
    let height = height.trim().parse().ok().filter(|h: &u32| *h > 0)?;
    Some((width, height))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

/// Reads a variable, treating blank values as unset.
fn optional(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::invalid(var, value.clone(), "not a number")),
        None => Ok(default),
    }
}

fn flag(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(var) {
        Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::invalid(var, value.clone(), "expected true or false")),
        None => Ok(default),
    }
}

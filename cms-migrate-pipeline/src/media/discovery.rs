//! Asset discovery: walk the uploads tree and group each original with its
//! size variants.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;
use walkdir::WalkDir;

lazy_static! {
    static ref DIMENSIONS_SUFFIX: Regex = Regex::new(r"^(\d+)x(\d+)$").unwrap();
    static ref NUMERIC_SUFFIX: Regex = Regex::new(r"-(\d+)\.[^./]+$").unwrap();
}

/// Extensions the image crate can decode and resize.
const RASTER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Returns the MIME type for a known media extension.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "mp4" => Some("video/mp4"),
        "mp3" => Some("audio/mpeg"),
        _ => None,
    }
}

pub fn is_raster(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| RASTER_EXTENSIONS.contains(&ext.as_str()))
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Legacy attachment id encoded as a trailing number, e.g. `banner-1234.jpg`.
pub fn numeric_suffix(filename: &str) -> Option<u64> {
    NUMERIC_SUFFIX
        .captures(filename)
        .and_then(|captures| captures[1].parse().ok())
}

/// The size a variant file stands for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VariantSize {
    /// A configured size such as `thumbnail`.
    Named(String),
    /// A legacy `<w>x<h>` size carrying its own dimensions.
    Dimensions(u32, u32),
}

impl VariantSize {
    pub fn name(&self) -> String {
        match self {
            VariantSize::Named(name) => name.clone(),
            VariantSize::Dimensions(width, height) => format!("{width}x{height}"),
        }
    }
}

/// An original file and every variant found beside it.
#[derive(Debug, Clone, Default)]
pub struct AssetGroup {
    pub directory: PathBuf,
    pub base: String,
    /// Files named `<base>.<ext>`; more than one when a converted copy exists.
    pub originals: Vec<PathBuf>,
    pub variants: BTreeMap<VariantSize, Vec<PathBuf>>,
}

impl AssetGroup {
    /// The file that represents the group: the copy in `preferred_extension`
    /// if there is one, else the first original by name.
    pub fn canonical_original(&self, preferred_extension: &str) -> Option<&PathBuf> {
        preferred(&self.originals, preferred_extension)
    }

    pub fn has_variant_named(&self, name: &str) -> bool {
        self.variants.keys().any(|size| size.name() == name)
    }
}

/// Picks the file with `extension` from `paths`, else the first one.
pub fn preferred<'a>(paths: &'a [PathBuf], extension: &str) -> Option<&'a PathBuf> {
    paths
        .iter()
        .find(|path| extension_of(path).as_deref() == Some(extension))
        .or_else(|| paths.first())
}

/// Splits a file stem into (base, size) when it ends in a size suffix.
pub fn classify_stem(stem: &str, named_sizes: &[String]) -> Option<(String, VariantSize)> {
    let (base, suffix) = stem.rsplit_once('-')?;
    if base.is_empty() {
        return None;
    }
    if named_sizes.iter().any(|name| name == suffix) {
        return Some((base.to_string(), VariantSize::Named(suffix.to_string())));
    }
    let captures = DIMENSIONS_SUFFIX.captures(suffix)?;
    let width = captures[1].parse().ok()?;
    let height = captures[2].parse().ok()?;
    Some((base.to_string(), VariantSize::Dimensions(width, height)))
}

/// Walks `root` and groups every known media file by (directory, base name).
///
/// Unreadable entries are logged and skipped. Groups are returned ordered by
/// directory and base name.
pub fn discover(root: &Path, named_sizes: &[String]) -> Vec<AssetGroup> {
    let mut groups: BTreeMap<(PathBuf, String), AssetGroup> = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable media entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(extension) = extension_of(path) else {
            continue;
        };
        if mime_for_extension(&extension).is_none() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let variant = if is_raster(path) {
            classify_stem(stem, named_sizes)
        } else {
            None
        };
        let (base, size) = match variant {
            Some((base, size)) => (base, Some(size)),
            None => (stem.to_string(), None),
        };

        let group = groups
            .entry((directory.clone(), base.clone()))
            .or_insert_with(|| AssetGroup {
                directory,
                base,
                ..Default::default()
            });
        match size {
            Some(size) => group.variants.entry(size).or_default().push(path.to_path_buf()),
            None => group.originals.push(path.to_path_buf()),
        }
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn sizes() -> Vec<String> {
        vec!["thumbnail".into(), "medium".into(), "large".into()]
    }

    #[test]
    fn test_classify_stem() {
        assert_eq!(
            classify_stem("photo-medium", &sizes()),
            Some(("photo".to_string(), VariantSize::Named("medium".to_string())))
        );
        assert_eq!(
            classify_stem("my-photo-300x200", &sizes()),
            Some(("my-photo".to_string(), VariantSize::Dimensions(300, 200)))
        );
        assert_eq!(classify_stem("my-photo", &sizes()), None);
        assert_eq!(classify_stem("-medium", &sizes()), None);
        assert_eq!(classify_stem("photo", &sizes()), None);
    }

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("banner-1234.jpg"), Some(1234));
        assert_eq!(numeric_suffix("banner.jpg"), None);
    }

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("svg"), Some("image/svg+xml"));
        assert_eq!(mime_for_extension("txt"), None);
    }

    #[test]
    fn test_discover_groups_variants_with_original() {
        let dir = tempfile::tempdir().unwrap();
        let month = dir.path().join("2021/05");
        fs::create_dir_all(&month).unwrap();
        for name in ["photo.jpg", "photo-medium.jpg", "photo-150x150.jpg", "orphan-large.png", "notes.txt", "doc.pdf"] {
            fs::write(month.join(name), b"x").unwrap();
        }

        let groups = discover(dir.path(), &sizes());
        assert_eq!(groups.len(), 3);

        let doc = &groups[0];
        assert_eq!(doc.base, "doc");
        assert_eq!(doc.originals.len(), 1);

        let orphan = &groups[1];
        assert_eq!(orphan.base, "orphan");
        assert!(orphan.originals.is_empty());
        assert!(orphan.has_variant_named("large"));

        let photo = &groups[2];
        assert_eq!(photo.base, "photo");
        assert_eq!(photo.originals, vec![month.join("photo.jpg")]);
        assert_eq!(photo.variants.len(), 2);
        assert!(photo.has_variant_named("medium"));
        assert!(photo.has_variant_named("150x150"));
    }

    #[test]
    fn test_canonical_original_prefers_extension() {
        let group = AssetGroup {
            originals: vec![PathBuf::from("a/photo.jpg"), PathBuf::from("a/photo.webp")],
            ..Default::default()
        };
        assert_eq!(group.canonical_original("webp"), Some(&PathBuf::from("a/photo.webp")));
        assert_eq!(group.canonical_original("png"), Some(&PathBuf::from("a/photo.jpg")));
    }
}

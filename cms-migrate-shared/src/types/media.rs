use crate::types::TargetId;

/// Canonical media asset. Deduplicated by `path` or by `wp_attachment_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaRecord {
    pub filename: String,
    /// Public path, e.g. `/uploads/2021/05/photo.webp`.
    pub path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub wp_attachment_id: Option<i64>,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
}

/// Derived size variant of a media asset, unique by (media id, name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSizeRecord {
    pub media_id: TargetId,
    pub name: String,
    pub path: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub file_size: i64,
}

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TargetId;

/// The closed set of content families of the target schema.
///
/// Each family owns its own table, translation table and meta table, and
/// polymorphic joins reference it through a dedicated nullable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentFamily {
    Page,
    Article,
    Portfolio,
    Product,
}

impl ContentFamily {
    pub const ALL: [ContentFamily; 4] = [
        ContentFamily::Page,
        ContentFamily::Article,
        ContentFamily::Portfolio,
        ContentFamily::Product,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFamily::Page => "page",
            ContentFamily::Article => "article",
            ContentFamily::Portfolio => "portfolio",
            ContentFamily::Product => "product",
        }
    }
}

impl fmt::Display for ContentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of a content row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentStatus {
    Draft,
    Pending,
    Published,
    Archived,
    Trash,
}

impl ContentStatus {
    /// Maps a legacy `post_status`. Anything outside the known set is archived.
    pub fn from_legacy(status: &str) -> Self {
        match status {
            "publish" => ContentStatus::Published,
            "draft" => ContentStatus::Draft,
            "pending" => ContentStatus::Pending,
            "trash" => ContentStatus::Trash,
            _ => ContentStatus::Archived,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "DRAFT",
            ContentStatus::Pending => "PENDING",
            ContentStatus::Published => "PUBLISHED",
            ContentStatus::Archived => "ARCHIVED",
            ContentStatus::Trash => "TRASH",
        }
    }
}

/// Reference to a single content row: the tagged form of the per-family
/// nullable foreign key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentRef {
    pub family: ContentFamily,
    pub id: TargetId,
}

impl ContentRef {
    pub fn new(family: ContentFamily, id: TargetId) -> Self {
        Self { family, id }
    }

    /// Returns the id when this reference points into `family`.
    pub fn id_for(&self, family: ContentFamily) -> Option<TargetId> {
        (self.family == family).then_some(self.id)
    }
}

/// Localized text of a content row, keyed by (content id, language).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub language: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

/// A content row ready to be upserted by slug within its family.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub family: ContentFamily,
    pub slug: String,
    pub status: ContentStatus,
    pub author_id: Option<TargetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub menu_order: i32,
    /// Only meaningful for products.
    pub price: Option<BigDecimal>,
    pub translation: Translation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_is_closed() {
        assert_eq!(ContentStatus::from_legacy("publish"), ContentStatus::Published);
        assert_eq!(ContentStatus::from_legacy("draft"), ContentStatus::Draft);
        assert_eq!(ContentStatus::from_legacy("pending"), ContentStatus::Pending);
        assert_eq!(ContentStatus::from_legacy("trash"), ContentStatus::Trash);
        assert_eq!(ContentStatus::from_legacy("private"), ContentStatus::Archived);
        assert_eq!(ContentStatus::from_legacy("future"), ContentStatus::Archived);
    }

    #[test]
    fn test_content_ref_id_for() {
        let page = ContentRef::new(ContentFamily::Page, 7);
        assert_eq!(page.id_for(ContentFamily::Page), Some(7));
        assert_eq!(page.id_for(ContentFamily::Article), None);
    }
}

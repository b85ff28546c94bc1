//! Row types of the legacy WordPress schema.
//!
//! Timestamps are kept as the raw text the source returned: WordPress stores
//! all-zero dates (`0000-00-00 00:00:00`) that are not valid calendar values,
//! so normalization is left to the consumers.

/// Numeric primary key used throughout the legacy schema.
pub type LegacyId = u64;

/// A row of the `posts` table. Pages, articles, attachments and menu items all
/// live here, distinguished by `post_type`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyPost {
    pub id: LegacyId,
    pub author_id: LegacyId,
    pub post_type: String,
    pub status: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub parent_id: LegacyId,
    pub menu_order: i64,
    pub mime_type: String,
}

/// A key/value row of one of the schemaless meta tables
/// (`postmeta`, `usermeta`, `commentmeta`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyMeta {
    pub meta_id: LegacyId,
    pub owner_id: LegacyId,
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyUser {
    pub id: LegacyId,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub registered_at: Option<String>,
    pub status: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyTerm {
    pub id: LegacyId,
    pub slug: String,
    pub name: String,
    pub group: i64,
}

/// The role a term plays inside one taxonomy. A single term may appear in
/// several taxonomies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyTermTaxonomy {
    pub id: LegacyId,
    pub term_id: LegacyId,
    pub taxonomy: String,
    pub description: String,
    /// Legacy id of the parent term-taxonomy row, `0` for roots.
    pub parent_id: LegacyId,
    pub count: i64,
}

/// Polymorphic join row: the type of `object_id` is only known after looking
/// up the referenced post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyTermRelationship {
    pub object_id: LegacyId,
    pub term_taxonomy_id: LegacyId,
    pub term_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyComment {
    pub id: LegacyId,
    pub post_id: LegacyId,
    pub author_name: String,
    pub author_email: String,
    pub author_url: String,
    pub created_at: Option<String>,
    pub content: String,
    pub approved: String,
    pub parent_id: LegacyId,
    pub user_id: LegacyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyOption {
    pub id: LegacyId,
    pub name: String,
    pub value: String,
    pub autoload: String,
}

/// An attachment post joined with the meta keys describing its file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyAttachment {
    pub id: LegacyId,
    pub title: String,
    pub caption: String,
    pub mime_type: String,
    /// Path relative to the uploads root (`_wp_attached_file`).
    pub attached_file: Option<String>,
    /// Alternative text (`_wp_attachment_image_alt`).
    pub alt: Option<String>,
}

//! This module defines the `TargetStore` trait, the idempotent write API over the
//! CMS schema.
use cms_migrate_shared::types::{
    CommentRecord, ContentFamily, ContentRecord, ContentRef, MediaRecord, MediaSizeRecord,
    MenuItemRecord, MenuRecord, MetaEntry, SettingRecord, TableCount, TargetId,
    TermRecord, TermRelationshipRecord, TermTaxonomyRecord, Upserted, UserRecord,
};

use crate::errors::TargetStoreError;

/// A trait that defines the interface for writing the migrated model.
///
/// Every `upsert_*` and `persist_*` method is keyed on the natural key of its
/// entity and can be called repeatedly with identical input without creating
/// duplicates. Meta rows are inserted with skip-duplicate semantics on
/// (owner id, key).
#[async_trait::async_trait]
pub trait TargetStore: Send + Sync {
    /// Deletes every row of every CMS table, children before parents, in a
    /// single transaction.
    async fn clear_all(&self) -> Result<(), TargetStoreError>;

    /// Upserts a user by email and attaches its meta rows atomically.
    ///
    /// # Arguments
    ///
    /// * `user` - The user to create or update.
    /// * `meta` - Meta rows; rows whose key already exists for this user are skipped.
    ///
    /// # Returns
    ///
    /// The surrogate id of the user and whether it was created.
    async fn persist_user(
        &self,
        user: &UserRecord,
        meta: &[MetaEntry],
    ) -> Result<Upserted, TargetStoreError>;

    /// Upserts a content row by slug within its family, upserts its translation
    /// by (content id, language) and attaches its meta rows, in one transaction.
    async fn persist_content(
        &self,
        content: &ContentRecord,
        meta: &[MetaEntry],
    ) -> Result<Upserted, TargetStoreError>;

    /// Finds a content row by slug within a family.
    async fn find_content_by_slug(
        &self,
        family: ContentFamily,
        slug: &str,
    ) -> Result<Option<TargetId>, TargetStoreError>;

    /// Sets or clears the parent of a page.
    async fn set_page_parent(
        &self,
        page_id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError>;

    /// Creates or replaces a single meta row of a content item.
    async fn upsert_content_meta(
        &self,
        content: ContentRef,
        entry: &MetaEntry,
    ) -> Result<Upserted, TargetStoreError>;

    /// Upserts a term by slug.
    async fn upsert_term(&self, term: &TermRecord) -> Result<Upserted, TargetStoreError>;

    async fn find_term_by_slug(&self, slug: &str) -> Result<Option<TargetId>, TargetStoreError>;

    /// Upserts a taxonomy row by (term id, taxonomy). The parent link is reset to null.
    async fn upsert_term_taxonomy(
        &self,
        taxonomy: &TermTaxonomyRecord,
    ) -> Result<Upserted, TargetStoreError>;

    async fn find_term_taxonomy(
        &self,
        term_id: TargetId,
        taxonomy: &str,
    ) -> Result<Option<TargetId>, TargetStoreError>;

    async fn set_term_taxonomy_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError>;

    /// Inserts a relationship row unless the same (taxonomy, content) pair exists.
    ///
    /// # Returns
    ///
    /// `true` when a row was inserted.
    async fn insert_term_relationship(
        &self,
        relationship: &TermRelationshipRecord,
    ) -> Result<bool, TargetStoreError>;

    /// Creates a comment and attaches its meta rows atomically.
    async fn persist_comment(
        &self,
        comment: &CommentRecord,
        meta: &[MetaEntry],
    ) -> Result<TargetId, TargetStoreError>;

    async fn set_comment_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError>;

    /// Creates a media row, or updates the existing one carrying the same path
    /// or the same legacy attachment id.
    async fn upsert_media(&self, media: &MediaRecord) -> Result<Upserted, TargetStoreError>;

    /// Upserts a size variant by (media id, name).
    async fn upsert_media_size(&self, size: &MediaSizeRecord) -> Result<Upserted, TargetStoreError>;

    async fn find_media_by_attachment_id(
        &self,
        attachment_id: i64,
    ) -> Result<Option<TargetId>, TargetStoreError>;

    async fn find_media_by_path(&self, path: &str) -> Result<Option<TargetId>, TargetStoreError>;

    /// Finds the lowest-id media row whose path contains `fragment`.
    async fn find_media_by_filename(
        &self,
        fragment: &str,
    ) -> Result<Option<TargetId>, TargetStoreError>;

    /// Upserts a menu by name.
    async fn upsert_menu(&self, menu: &MenuRecord) -> Result<Upserted, TargetStoreError>;

    /// Removes every item of a menu so that it can be rebuilt.
    async fn clear_menu_items(&self, menu_id: TargetId) -> Result<u64, TargetStoreError>;

    async fn insert_menu_item(&self, item: &MenuItemRecord) -> Result<TargetId, TargetStoreError>;

    async fn set_menu_item_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError>;

    /// Upserts a setting by key.
    async fn upsert_setting(&self, setting: &SettingRecord) -> Result<Upserted, TargetStoreError>;

    /// Returns the row count of every CMS table.
    async fn table_counts(&self) -> Result<Vec<TableCount>, TargetStoreError>;
}

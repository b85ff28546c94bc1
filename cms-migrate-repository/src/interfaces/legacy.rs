//! This module defines the `LegacySource` trait, the read-only query façade over
//! the legacy WordPress schema.
use cms_migrate_shared::types::{
    LegacyAttachment, LegacyComment, LegacyId, LegacyMeta, LegacyOption, LegacyPost, LegacyTerm,
    LegacyTermRelationship, LegacyTermTaxonomy, LegacyUser,
};

use crate::errors::LegacySourceError;

/// A trait that defines read access to the legacy schema.
///
/// Implementors never mutate the source. Every "find all" operation returns rows
/// in ascending legacy-id order. A row that does not exist is reported as
/// `None` or an empty list, never as an error.
#[async_trait::async_trait]
pub trait LegacySource: Send + Sync {
    /// Returns every user.
    async fn find_users(&self) -> Result<Vec<LegacyUser>, LegacySourceError>;

    /// Returns the meta rows of one user.
    async fn find_user_meta(&self, user_id: LegacyId) -> Result<Vec<LegacyMeta>, LegacySourceError>;

    /// Returns every post whose `post_type` is one of `post_types`.
    ///
    /// # Arguments
    ///
    /// * `post_types` - Legacy type tags, e.g. `["page", "post"]`. An empty slice yields no rows.
    async fn find_posts_by_types(
        &self,
        post_types: &[String],
    ) -> Result<Vec<LegacyPost>, LegacySourceError>;

    /// Returns one post by id.
    async fn find_post(&self, id: LegacyId) -> Result<Option<LegacyPost>, LegacySourceError>;

    /// Returns the posts with the given ids, in ascending id order. Unknown ids are ignored.
    async fn find_posts_by_ids(&self, ids: &[LegacyId]) -> Result<Vec<LegacyPost>, LegacySourceError>;

    /// Returns the meta rows of one post.
    async fn find_post_meta(&self, post_id: LegacyId) -> Result<Vec<LegacyMeta>, LegacySourceError>;

    /// Returns every post meta row carrying `key`, across all posts.
    async fn find_post_meta_by_key(&self, key: &str) -> Result<Vec<LegacyMeta>, LegacySourceError>;

    async fn find_terms(&self) -> Result<Vec<LegacyTerm>, LegacySourceError>;

    async fn find_term(&self, id: LegacyId) -> Result<Option<LegacyTerm>, LegacySourceError>;

    async fn find_term_taxonomies(&self) -> Result<Vec<LegacyTermTaxonomy>, LegacySourceError>;

    async fn find_term_taxonomy(
        &self,
        id: LegacyId,
    ) -> Result<Option<LegacyTermTaxonomy>, LegacySourceError>;

    /// Returns the taxonomy rows of one kind, e.g. `nav_menu`.
    async fn find_term_taxonomies_by_kind(
        &self,
        kind: &str,
    ) -> Result<Vec<LegacyTermTaxonomy>, LegacySourceError>;

    async fn find_term_relationships(&self) -> Result<Vec<LegacyTermRelationship>, LegacySourceError>;

    /// Returns the relationship rows of one taxonomy row.
    async fn find_term_relationships_by_taxonomy(
        &self,
        term_taxonomy_id: LegacyId,
    ) -> Result<Vec<LegacyTermRelationship>, LegacySourceError>;

    async fn find_comments(&self) -> Result<Vec<LegacyComment>, LegacySourceError>;

    async fn find_comment_meta(
        &self,
        comment_id: LegacyId,
    ) -> Result<Vec<LegacyMeta>, LegacySourceError>;

    async fn find_options(&self) -> Result<Vec<LegacyOption>, LegacySourceError>;

    /// Returns every attachment post joined with its file, alt text and caption.
    async fn find_attachments(&self) -> Result<Vec<LegacyAttachment>, LegacySourceError>;
}

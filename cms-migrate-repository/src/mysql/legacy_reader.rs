//! MySQL implementation of the `LegacySource` trait.
//!
//! Reads a WordPress schema whose table names share a configurable prefix
//! (`wp_posts`, `as_posts`, ...). The prefix is validated once at construction
//! because it is spliced into identifiers rather than bound as a parameter.
//!
//! ## Conventions
//!
//! - Datetime columns are selected as `CAST(... AS CHAR)` so all-zero dates
//!   survive decoding and reach the caller verbatim.
//! - Signed integer columns of varying widths are cast to `SIGNED` and decoded as `i64`.
//! - All "find all" queries order by primary key.
use async_trait::async_trait;
use cms_migrate_shared::types::{
    LegacyAttachment, LegacyComment, LegacyId, LegacyMeta, LegacyOption, LegacyPost, LegacyTerm,
    LegacyTermRelationship, LegacyTermTaxonomy, LegacyUser,
};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use tracing::debug;

use crate::{LegacySource, LegacySourceError};

/// Read-only access to a WordPress database.
pub struct MySqlLegacySource {
    pool: MySqlPool,
    prefix: String,
}

impl MySqlLegacySource {
    /// Creates a legacy source over an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Connection pool of the WordPress database
    /// * `prefix` - Table prefix, restricted to ASCII letters, digits and `_`
    ///
    /// # Returns
    ///
    /// * `Ok(MySqlLegacySource)` - Ready-to-use source
    /// * `Err(LegacySourceError::InvalidTablePrefix)` - The prefix contains other characters
    pub fn new(pool: MySqlPool, prefix: impl Into<String>) -> Result<Self, LegacySourceError> {
        let prefix = prefix.into();
        if !is_valid_prefix(&prefix) {
            return Err(LegacySourceError::InvalidTablePrefix(prefix));
        }
        Ok(Self { pool, prefix })
    }

    /// Opens a pool against `url` and verifies the connection.
    pub async fn connect(
        url: &str,
        prefix: impl Into<String>,
        max_connections: u32,
    ) -> Result<Self, LegacySourceError> {
        let prefix = prefix.into();
        if !is_valid_prefix(&prefix) {
            return Err(LegacySourceError::InvalidTablePrefix(prefix));
        }
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Self::new(pool, prefix)
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn post_columns() -> &'static str {
        "ID, post_author, post_type, post_status, post_title, post_content, post_excerpt, \
         post_name, CAST(post_date AS CHAR) AS post_date, \
         CAST(post_modified AS CHAR) AS post_modified, post_parent, \
         CAST(menu_order AS SIGNED) AS menu_order, post_mime_type"
    }

    async fn fetch_meta(
        &self,
        table: &str,
        id_column: &str,
        owner_column: &str,
        owner_id: LegacyId,
    ) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        let sql = format!(
            "SELECT {id_column} AS meta_id, {owner_column} AS owner_id, meta_key, meta_value \
             FROM {} WHERE {owner_column} = ? ORDER BY {id_column}",
            self.table(table)
        );
        let rows = sqlx::query(&sql).bind(owner_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(meta_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn post_from_row(row: &MySqlRow) -> Result<LegacyPost, sqlx::Error> {
    Ok(LegacyPost {
        id: row.try_get("ID")?,
        author_id: row.try_get("post_author")?,
        post_type: row.try_get("post_type")?,
        status: row.try_get("post_status")?,
        title: row.try_get("post_title")?,
        content: row.try_get("post_content")?,
        excerpt: row.try_get("post_excerpt")?,
        slug: row.try_get("post_name")?,
        created_at: row.try_get("post_date")?,
        modified_at: row.try_get("post_modified")?,
        parent_id: row.try_get("post_parent")?,
        menu_order: row.try_get("menu_order")?,
        mime_type: row.try_get("post_mime_type")?,
    })
}

fn meta_from_row(row: &MySqlRow) -> Result<LegacyMeta, sqlx::Error> {
    Ok(LegacyMeta {
        meta_id: row.try_get("meta_id")?,
        owner_id: row.try_get("owner_id")?,
        key: row.try_get::<Option<String>, _>("meta_key")?.unwrap_or_default(),
        value: row.try_get("meta_value")?,
    })
}

fn term_from_row(row: &MySqlRow) -> Result<LegacyTerm, sqlx::Error> {
    Ok(LegacyTerm {
        id: row.try_get("term_id")?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        group: row.try_get("term_group")?,
    })
}

fn term_taxonomy_from_row(row: &MySqlRow) -> Result<LegacyTermTaxonomy, sqlx::Error> {
    Ok(LegacyTermTaxonomy {
        id: row.try_get("term_taxonomy_id")?,
        term_id: row.try_get("term_id")?,
        taxonomy: row.try_get("taxonomy")?,
        description: row.try_get("description")?,
        parent_id: row.try_get("parent")?,
        count: row.try_get("count")?,
    })
}

fn relationship_from_row(row: &MySqlRow) -> Result<LegacyTermRelationship, sqlx::Error> {
    Ok(LegacyTermRelationship {
        object_id: row.try_get("object_id")?,
        term_taxonomy_id: row.try_get("term_taxonomy_id")?,
        term_order: row.try_get("term_order")?,
    })
}

const TERM_TAXONOMY_COLUMNS: &str = "term_taxonomy_id, term_id, taxonomy, description, parent, \
                                     CAST(count AS SIGNED) AS count";

const RELATIONSHIP_COLUMNS: &str =
    "object_id, term_taxonomy_id, CAST(term_order AS SIGNED) AS term_order";

#[async_trait]
impl LegacySource for MySqlLegacySource {
    async fn find_users(&self) -> Result<Vec<LegacyUser>, LegacySourceError> {
        let sql = format!(
            "SELECT ID, user_login, user_email, user_pass, display_name, \
             CAST(user_registered AS CHAR) AS user_registered, \
             CAST(user_status AS SIGNED) AS user_status \
             FROM {} ORDER BY ID",
            self.table("users")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let users = rows
            .iter()
            .map(|row| -> Result<LegacyUser, sqlx::Error> {
                Ok(LegacyUser {
                    id: row.try_get("ID")?,
                    login: row.try_get("user_login")?,
                    email: row.try_get("user_email")?,
                    password_hash: row.try_get("user_pass")?,
                    display_name: row.try_get("display_name")?,
                    registered_at: row.try_get("user_registered")?,
                    status: row.try_get("user_status")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = users.len(), "Read legacy users");
        Ok(users)
    }

    async fn find_user_meta(&self, user_id: LegacyId) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        self.fetch_meta("usermeta", "umeta_id", "user_id", user_id).await
    }

    async fn find_posts_by_types(
        &self,
        post_types: &[String],
    ) -> Result<Vec<LegacyPost>, LegacySourceError> {
        if post_types.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE post_type IN (",
            Self::post_columns(),
            self.table("posts")
        ));
        let mut separated = query_builder.separated(", ");
        for post_type in post_types {
            separated.push_bind(post_type.clone());
        }
        separated.push_unseparated(") ORDER BY ID");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        let posts = rows.iter().map(post_from_row).collect::<Result<Vec<_>, _>>()?;
        debug!(count = posts.len(), types = ?post_types, "Read legacy posts");
        Ok(posts)
    }

    async fn find_post(&self, id: LegacyId) -> Result<Option<LegacyPost>, LegacySourceError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE ID = ?",
            Self::post_columns(),
            self.table("posts")
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(post_from_row).transpose()?)
    }

    async fn find_posts_by_ids(&self, ids: &[LegacyId]) -> Result<Vec<LegacyPost>, LegacySourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE ID IN (",
            Self::post_columns(),
            self.table("posts")
        ));
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY ID");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(post_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_post_meta(&self, post_id: LegacyId) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        self.fetch_meta("postmeta", "meta_id", "post_id", post_id).await
    }

    async fn find_post_meta_by_key(&self, key: &str) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        let sql = format!(
            "SELECT meta_id, post_id AS owner_id, meta_key, meta_value \
             FROM {} WHERE meta_key = ? ORDER BY meta_id",
            self.table("postmeta")
        );
        let rows = sqlx::query(&sql).bind(key).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(meta_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_terms(&self) -> Result<Vec<LegacyTerm>, LegacySourceError> {
        let sql = format!(
            "SELECT term_id, slug, name, CAST(term_group AS SIGNED) AS term_group \
             FROM {} ORDER BY term_id",
            self.table("terms")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(term_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_term(&self, id: LegacyId) -> Result<Option<LegacyTerm>, LegacySourceError> {
        let sql = format!(
            "SELECT term_id, slug, name, CAST(term_group AS SIGNED) AS term_group \
             FROM {} WHERE term_id = ?",
            self.table("terms")
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(term_from_row).transpose()?)
    }

    async fn find_term_taxonomies(&self) -> Result<Vec<LegacyTermTaxonomy>, LegacySourceError> {
        let sql = format!(
            "SELECT {TERM_TAXONOMY_COLUMNS} FROM {} ORDER BY term_taxonomy_id",
            self.table("term_taxonomy")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(term_taxonomy_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_term_taxonomy(
        &self,
        id: LegacyId,
    ) -> Result<Option<LegacyTermTaxonomy>, LegacySourceError> {
        let sql = format!(
            "SELECT {TERM_TAXONOMY_COLUMNS} FROM {} WHERE term_taxonomy_id = ?",
            self.table("term_taxonomy")
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(term_taxonomy_from_row).transpose()?)
    }

    async fn find_term_taxonomies_by_kind(
        &self,
        kind: &str,
    ) -> Result<Vec<LegacyTermTaxonomy>, LegacySourceError> {
        let sql = format!(
            "SELECT {TERM_TAXONOMY_COLUMNS} FROM {} WHERE taxonomy = ? ORDER BY term_taxonomy_id",
            self.table("term_taxonomy")
        );
        let rows = sqlx::query(&sql).bind(kind).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(term_taxonomy_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_term_relationships(&self) -> Result<Vec<LegacyTermRelationship>, LegacySourceError> {
        let sql = format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM {} ORDER BY object_id, term_taxonomy_id",
            self.table("term_relationships")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(relationship_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_term_relationships_by_taxonomy(
        &self,
        term_taxonomy_id: LegacyId,
    ) -> Result<Vec<LegacyTermRelationship>, LegacySourceError> {
        let sql = format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM {} WHERE term_taxonomy_id = ? ORDER BY object_id",
            self.table("term_relationships")
        );
        let rows = sqlx::query(&sql).bind(term_taxonomy_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(relationship_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_comments(&self) -> Result<Vec<LegacyComment>, LegacySourceError> {
        let sql = format!(
            "SELECT comment_ID, comment_post_ID, comment_author, comment_author_email, \
             comment_author_url, CAST(comment_date AS CHAR) AS comment_date, comment_content, \
             comment_approved, comment_parent, user_id \
             FROM {} ORDER BY comment_ID",
            self.table("comments")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let comments = rows
            .iter()
            .map(|row| -> Result<LegacyComment, sqlx::Error> {
                Ok(LegacyComment {
                    id: row.try_get("comment_ID")?,
                    post_id: row.try_get("comment_post_ID")?,
                    author_name: row.try_get("comment_author")?,
                    author_email: row.try_get("comment_author_email")?,
                    author_url: row.try_get("comment_author_url")?,
                    created_at: row.try_get("comment_date")?,
                    content: row.try_get("comment_content")?,
                    approved: row.try_get("comment_approved")?,
                    parent_id: row.try_get("comment_parent")?,
                    user_id: row.try_get("user_id")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    async fn find_comment_meta(
        &self,
        comment_id: LegacyId,
    ) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        self.fetch_meta("commentmeta", "meta_id", "comment_id", comment_id).await
    }

    async fn find_options(&self) -> Result<Vec<LegacyOption>, LegacySourceError> {
        let sql = format!(
            "SELECT option_id, option_name, option_value, autoload FROM {} ORDER BY option_id",
            self.table("options")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let options = rows
            .iter()
            .map(|row| -> Result<LegacyOption, sqlx::Error> {
                Ok(LegacyOption {
                    id: row.try_get("option_id")?,
                    name: row.try_get("option_name")?,
                    value: row.try_get("option_value")?,
                    autoload: row.try_get("autoload")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(options)
    }

    async fn find_attachments(&self) -> Result<Vec<LegacyAttachment>, LegacySourceError> {
        let posts = self.table("posts");
        let postmeta = self.table("postmeta");
        let sql = format!(
            "SELECT p.ID, p.post_title, p.post_excerpt, p.post_mime_type, \
             (SELECT m.meta_value FROM {postmeta} m \
              WHERE m.post_id = p.ID AND m.meta_key = '_wp_attached_file' \
              ORDER BY m.meta_id LIMIT 1) AS attached_file, \
             (SELECT m.meta_value FROM {postmeta} m \
              WHERE m.post_id = p.ID AND m.meta_key = '_wp_attachment_image_alt' \
              ORDER BY m.meta_id LIMIT 1) AS alt \
             FROM {posts} p WHERE p.post_type = 'attachment' ORDER BY p.ID"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let attachments = rows
            .iter()
            .map(|row| -> Result<LegacyAttachment, sqlx::Error> {
                Ok(LegacyAttachment {
                    id: row.try_get("ID")?,
                    title: row.try_get("post_title")?,
                    caption: row.try_get("post_excerpt")?,
                    mime_type: row.try_get("post_mime_type")?,
                    attached_file: row.try_get("attached_file")?,
                    alt: row.try_get("alt")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = attachments.len(), "Read legacy attachments");
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_validation() {
        assert!(is_valid_prefix("wp_"));
        assert!(is_valid_prefix("as_"));
        assert!(is_valid_prefix(""));
        assert!(!is_valid_prefix("wp_; DROP TABLE"));
        assert!(!is_valid_prefix("wp-"));
    }
}

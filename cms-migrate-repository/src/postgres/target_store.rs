//! PostgreSQL implementation of the migration target store.
//!
//! Writes the CMS schema with natural-key upserts so that every operation can
//! be repeated without creating duplicates.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Multi-table writes (content + translation + meta) in one transaction
//! - Upserts with `ON CONFLICT DO UPDATE`, reporting insert vs update through `xmax`
//! - Bulk meta inserts with `QueryBuilder` and `ON CONFLICT DO NOTHING`
//!
//! ## Database Tables
//!
//! See `migrations/0001_cms_schema.sql`. Each content family owns a content,
//! translation and meta table; polymorphic joins use one nullable column per family.
use async_trait::async_trait;
use cms_migrate_shared::types::{
    CommentRecord, ContentFamily, ContentRecord, ContentRef, MediaRecord, MediaSizeRecord,
    MenuItemRecord, MenuRecord, MetaEntry, SettingRecord, TableCount, TargetId, TermRecord,
    TermRelationshipRecord, TermTaxonomyRecord, Upserted, UserRecord,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{debug, info};

use crate::postgres::tables::{CLEAR_ORDER, ContentTables};
use crate::{TargetStore, TargetStoreError};

/// PostgreSQL implementation of the target store.
pub struct PostgresTargetStore {
    pool: PgPool,
}

fn upserted_from_row(row: &PgRow) -> Result<Upserted, sqlx::Error> {
    Ok(Upserted {
        id: row.try_get("id")?,
        created: row.try_get("inserted")?,
    })
}

/// Foreign key column values for an optional content reference, in the order
/// page, article, portfolio, product.
fn family_columns(content: Option<ContentRef>) -> [Option<TargetId>; 4] {
    let id_for = |family: ContentFamily| content.and_then(|c| c.id_for(family));
    [
        id_for(ContentFamily::Page),
        id_for(ContentFamily::Article),
        id_for(ContentFamily::Portfolio),
        id_for(ContentFamily::Product),
    ]
}

impl PostgresTargetStore {
    /// Creates a new target store.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the CMS schema
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, TargetStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn run_migrations(&self) -> Result<(), TargetStoreError> {
        sqlx::migrate!("src/postgres/migrations").run(&self.pool).await?;
        info!("Target schema is up to date");
        Ok(())
    }

    /// Inserts meta rows for one owner, skipping keys the owner already has.
    ///
    /// # Arguments
    ///
    /// * `table` - Meta table name
    /// * `owner_column` - Column referencing the owner row
    /// * `owner_id` - Surrogate id of the owner
    /// * `entries` - Rows to insert (empty slices are no-ops)
    /// * `with_media` - Whether the table carries a `media_id` column
    /// * `tx` - Active transaction context
    async fn insert_meta_tx(
        &self,
        table: &str,
        owner_column: &str,
        owner_id: TargetId,
        entries: &[MetaEntry],
        with_media: bool,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<u64, TargetStoreError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let columns = if with_media {
            format!("INSERT INTO {table} ({owner_column}, key, value, media_id) ")
        } else {
            format!("INSERT INTO {table} ({owner_column}, key, value) ")
        };
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(columns);
        query_builder.push_values(entries, |mut b, entry| {
            b.push_bind(owner_id)
                .push_bind(entry.key.clone())
                .push_bind(entry.value.clone());
            if with_media {
                b.push_bind(entry.media_id);
            }
        });
        query_builder.push(format!(" ON CONFLICT ({owner_column}, key) DO NOTHING"));

        let result = query_builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    async fn upsert_user_tx(
        &self,
        user: &UserRecord,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Upserted, TargetStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cms_users (login, email, password_hash, display_name, role, is_active, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email)
            DO UPDATE SET
                login = EXCLUDED.login,
                password_hash = EXCLUDED.password_hash,
                display_name = EXCLUDED.display_name,
                role = EXCLUDED.role,
                is_active = EXCLUDED.is_active,
                registered_at = EXCLUDED.registered_at
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.registered_at)
        .fetch_one(&mut **tx)
        .await?;
        Ok(upserted_from_row(&row)?)
    }

    /// Upserts the content row itself by slug. Page parents are left untouched;
    /// they are wired separately once every page exists.
    async fn upsert_content_tx(
        &self,
        content: &ContentRecord,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Upserted, TargetStoreError> {
        let tables = ContentTables::of(content.family);
        let with_price = content.family == ContentFamily::Product;

        let (extra_column, extra_value, extra_update) = if with_price {
            (", price", ", $7", ", price = EXCLUDED.price")
        } else {
            ("", "", "")
        };
        let sql = format!(
            "INSERT INTO {table} (slug, status, author_id, created_at, updated_at, menu_order{extra_column}) \
             VALUES ($1, $2, $3, $4, $5, $6{extra_value}) \
             ON CONFLICT (slug) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 author_id = EXCLUDED.author_id, \
                 created_at = EXCLUDED.created_at, \
                 updated_at = EXCLUDED.updated_at, \
                 menu_order = EXCLUDED.menu_order{extra_update} \
             RETURNING id, (xmax = 0) AS inserted",
            table = tables.content,
        );

        let mut query = sqlx::query(&sql)
            .bind(&content.slug)
            .bind(content.status.as_str())
            .bind(content.author_id)
            .bind(content.created_at)
            .bind(content.updated_at)
            .bind(content.menu_order);
        if with_price {
            query = query.bind(content.price.clone());
        }

        let row = query.fetch_one(&mut **tx).await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn upsert_translation_tx(
        &self,
        family: ContentFamily,
        content_id: TargetId,
        content: &ContentRecord,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<(), TargetStoreError> {
        let sql = format!(
            "INSERT INTO {} (content_id, language, title, content, excerpt) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (content_id, language) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 content = EXCLUDED.content, \
                 excerpt = EXCLUDED.excerpt",
            ContentTables::of(family).translations
        );
        sqlx::query(&sql)
            .bind(content_id)
            .bind(&content.translation.language)
            .bind(&content.translation.title)
            .bind(&content.translation.content)
            .bind(&content.translation.excerpt)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn insert_comment_tx(
        &self,
        comment: &CommentRecord,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<TargetId, TargetStoreError> {
        let [page_id, article_id, portfolio_id, product_id] = family_columns(comment.content);
        let id: TargetId = sqlx::query_scalar(
            r#"
            INSERT INTO cms_comments
                (page_id, article_id, portfolio_id, product_id, user_id,
                 author_name, author_email, author_url, content, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(page_id)
        .bind(article_id)
        .bind(portfolio_id)
        .bind(product_id)
        .bind(comment.user_id)
        .bind(&comment.author_name)
        .bind(&comment.author_email)
        .bind(&comment.author_url)
        .bind(&comment.body)
        .bind(comment.status.as_str())
        .bind(comment.created_at)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    async fn set_parent(
        &self,
        table: &'static str,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        let sql = format!("UPDATE {table} SET parent_id = $2 WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(parent_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TargetStoreError::NotFound { table, id });
        }
        Ok(())
    }
}

#[async_trait]
impl TargetStore for PostgresTargetStore {
    async fn clear_all(&self) -> Result<(), TargetStoreError> {
        let mut tx = self.pool.begin().await?;
        for table in CLEAR_ORDER {
            let result = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
            debug!(table, rows = result.rows_affected(), "Cleared table");
        }
        tx.commit().await?;
        Ok(())
    }

    async fn persist_user(
        &self,
        user: &UserRecord,
        meta: &[MetaEntry],
    ) -> Result<Upserted, TargetStoreError> {
        let mut tx = self.pool.begin().await?;
        let upserted = self.upsert_user_tx(user, &mut tx).await?;
        self.insert_meta_tx("cms_user_meta", "user_id", upserted.id, meta, false, &mut tx)
            .await?;
        tx.commit().await?;
        Ok(upserted)
    }

    async fn persist_content(
        &self,
        content: &ContentRecord,
        meta: &[MetaEntry],
    ) -> Result<Upserted, TargetStoreError> {
        let tables = ContentTables::of(content.family);
        let mut tx = self.pool.begin().await?;
        let upserted = self.upsert_content_tx(content, &mut tx).await?;
        self.upsert_translation_tx(content.family, upserted.id, content, &mut tx)
            .await?;
        self.insert_meta_tx(tables.meta, "content_id", upserted.id, meta, true, &mut tx)
            .await?;
        tx.commit().await?;
        Ok(upserted)
    }

    async fn find_content_by_slug(
        &self,
        family: ContentFamily,
        slug: &str,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let sql = format!(
            "SELECT id FROM {} WHERE slug = $1",
            ContentTables::of(family).content
        );
        let id = sqlx::query_scalar(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn set_page_parent(
        &self,
        page_id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        self.set_parent("cms_pages", page_id, parent_id).await
    }

    async fn upsert_content_meta(
        &self,
        content: ContentRef,
        entry: &MetaEntry,
    ) -> Result<Upserted, TargetStoreError> {
        let sql = format!(
            "INSERT INTO {} (content_id, key, value, media_id) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (content_id, key) DO UPDATE SET \
                 value = EXCLUDED.value, \
                 media_id = EXCLUDED.media_id \
             RETURNING id, (xmax = 0) AS inserted",
            ContentTables::of(content.family).meta
        );
        let row = sqlx::query(&sql)
            .bind(content.id)
            .bind(&entry.key)
            .bind(&entry.value)
            .bind(entry.media_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn upsert_term(&self, term: &TermRecord) -> Result<Upserted, TargetStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cms_terms (slug, name, term_group)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug)
            DO UPDATE SET
                name = EXCLUDED.name,
                term_group = EXCLUDED.term_group
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&term.slug)
        .bind(&term.name)
        .bind(term.group)
        .fetch_one(&self.pool)
        .await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn find_term_by_slug(&self, slug: &str) -> Result<Option<TargetId>, TargetStoreError> {
        let id = sqlx::query_scalar("SELECT id FROM cms_terms WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn upsert_term_taxonomy(
        &self,
        taxonomy: &TermTaxonomyRecord,
    ) -> Result<Upserted, TargetStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cms_term_taxonomies (term_id, taxonomy, description, count, parent_id)
            VALUES ($1, $2, $3, $4, NULL)
            ON CONFLICT (term_id, taxonomy)
            DO UPDATE SET
                description = EXCLUDED.description,
                count = EXCLUDED.count,
                parent_id = NULL
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(taxonomy.term_id)
        .bind(&taxonomy.taxonomy)
        .bind(&taxonomy.description)
        .bind(taxonomy.count)
        .fetch_one(&self.pool)
        .await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn find_term_taxonomy(
        &self,
        term_id: TargetId,
        taxonomy: &str,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let id = sqlx::query_scalar(
            "SELECT id FROM cms_term_taxonomies WHERE term_id = $1 AND taxonomy = $2",
        )
        .bind(term_id)
        .bind(taxonomy)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn set_term_taxonomy_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        self.set_parent("cms_term_taxonomies", id, parent_id).await
    }

    async fn insert_term_relationship(
        &self,
        relationship: &TermRelationshipRecord,
    ) -> Result<bool, TargetStoreError> {
        let [page_id, article_id, portfolio_id, product_id] =
            family_columns(Some(relationship.content));
        let result = sqlx::query(
            r#"
            INSERT INTO cms_term_relationships
                (term_taxonomy_id, page_id, article_id, portfolio_id, product_id, term_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(relationship.term_taxonomy_id)
        .bind(page_id)
        .bind(article_id)
        .bind(portfolio_id)
        .bind(product_id)
        .bind(relationship.term_order)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn persist_comment(
        &self,
        comment: &CommentRecord,
        meta: &[MetaEntry],
    ) -> Result<TargetId, TargetStoreError> {
        let mut tx = self.pool.begin().await?;
        let id = self.insert_comment_tx(comment, &mut tx).await?;
        self.insert_meta_tx("cms_comment_meta", "comment_id", id, meta, false, &mut tx)
            .await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn set_comment_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        self.set_parent("cms_comments", id, parent_id).await
    }

    async fn upsert_media(&self, media: &MediaRecord) -> Result<Upserted, TargetStoreError> {
        let mut tx = self.pool.begin().await?;
        let existing: Option<TargetId> = sqlx::query_scalar(
            r#"
            SELECT id FROM cms_media
            WHERE path = $1 OR ($2::BIGINT IS NOT NULL AND wp_attachment_id = $2)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(&media.path)
        .bind(media.wp_attachment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let upserted = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE cms_media SET
                        filename = $2,
                        path = $3,
                        mime_type = $4,
                        file_size = $5,
                        width = $6,
                        height = $7,
                        wp_attachment_id = COALESCE($8, wp_attachment_id),
                        alt = COALESCE($9, alt),
                        title = COALESCE($10, title),
                        caption = COALESCE($11, caption)
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&media.filename)
                .bind(&media.path)
                .bind(&media.mime_type)
                .bind(media.file_size)
                .bind(media.width)
                .bind(media.height)
                .bind(media.wp_attachment_id)
                .bind(&media.alt)
                .bind(&media.title)
                .bind(&media.caption)
                .execute(&mut *tx)
                .await?;
                Upserted::updated(id)
            }
            None => {
                let id: TargetId = sqlx::query_scalar(
                    r#"
                    INSERT INTO cms_media
                        (filename, path, mime_type, file_size, width, height,
                         wp_attachment_id, alt, title, caption)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    RETURNING id
                    "#,
                )
                .bind(&media.filename)
                .bind(&media.path)
                .bind(&media.mime_type)
                .bind(media.file_size)
                .bind(media.width)
                .bind(media.height)
                .bind(media.wp_attachment_id)
                .bind(&media.alt)
                .bind(&media.title)
                .bind(&media.caption)
                .fetch_one(&mut *tx)
                .await?;
                Upserted::created(id)
            }
        };

        tx.commit().await?;
        Ok(upserted)
    }

    async fn upsert_media_size(&self, size: &MediaSizeRecord) -> Result<Upserted, TargetStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cms_media_sizes (media_id, name, path, width, height, file_size)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (media_id, name)
            DO UPDATE SET
                path = EXCLUDED.path,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                file_size = EXCLUDED.file_size
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(size.media_id)
        .bind(&size.name)
        .bind(&size.path)
        .bind(size.width)
        .bind(size.height)
        .bind(size.file_size)
        .fetch_one(&self.pool)
        .await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn find_media_by_attachment_id(
        &self,
        attachment_id: i64,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let id = sqlx::query_scalar("SELECT id FROM cms_media WHERE wp_attachment_id = $1")
            .bind(attachment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_media_by_path(&self, path: &str) -> Result<Option<TargetId>, TargetStoreError> {
        let id = sqlx::query_scalar("SELECT id FROM cms_media WHERE path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_media_by_filename(
        &self,
        fragment: &str,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let id = sqlx::query_scalar(
            "SELECT id FROM cms_media WHERE strpos(path, $1) > 0 ORDER BY id LIMIT 1",
        )
        .bind(fragment)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn upsert_menu(&self, menu: &MenuRecord) -> Result<Upserted, TargetStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cms_menus (name, location)
            VALUES ($1, $2)
            ON CONFLICT (name)
            DO UPDATE SET location = EXCLUDED.location
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&menu.name)
        .bind(&menu.location)
        .fetch_one(&self.pool)
        .await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn clear_menu_items(&self, menu_id: TargetId) -> Result<u64, TargetStoreError> {
        let result = sqlx::query("DELETE FROM cms_menu_items WHERE menu_id = $1")
            .bind(menu_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_menu_item(&self, item: &MenuItemRecord) -> Result<TargetId, TargetStoreError> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO cms_menu_items
                (menu_id, title, url, route, target, css_class, item_order, page_id, article_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(item.menu_id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.route)
        .bind(&item.target)
        .bind(&item.css_class)
        .bind(item.order)
        .bind(item.page_id)
        .bind(item.article_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn set_menu_item_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        self.set_parent("cms_menu_items", id, parent_id).await
    }

    async fn upsert_setting(&self, setting: &SettingRecord) -> Result<Upserted, TargetStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cms_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .fetch_one(&self.pool)
        .await?;
        Ok(upserted_from_row(&row)?)
    }

    async fn table_counts(&self) -> Result<Vec<TableCount>, TargetStoreError> {
        let mut counts = Vec::with_capacity(CLEAR_ORDER.len());
        for table in CLEAR_ORDER.iter().rev() {
            let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await?;
            counts.push(TableCount {
                table: table.to_string(),
                rows,
            });
        }
        Ok(counts)
    }
}

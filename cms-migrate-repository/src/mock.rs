//! In-memory legacy source and target store for testing and local development.
//!
//! `MockLegacySource` serves a fixed WordPress snapshot. `MockTargetStore`
//! enforces the same natural keys as the PostgreSQL schema so that idempotence
//! and uniqueness can be asserted without a database.
//!
//! # Example
//!
//! ```ignore
//! use cms_migrate_repository::{MockLegacySource, MockTargetStore, mock::LegacySnapshot};
//!
//! let legacy = MockLegacySource::new(LegacySnapshot {
//!     posts: vec![LegacyPost { id: 42, post_type: "page".into(), ..Default::default() }],
//!     ..Default::default()
//! });
//! let target = MockTargetStore::new();
//! ```

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cms_migrate_shared::types::{
    CommentRecord, ContentFamily, ContentRecord, ContentRef, LegacyAttachment, LegacyComment,
    LegacyId, LegacyMeta, LegacyOption, LegacyPost, LegacyTerm, LegacyTermRelationship,
    LegacyTermTaxonomy, LegacyUser, MediaRecord, MediaSizeRecord, MenuItemRecord, MenuRecord,
    MetaEntry, SettingRecord, TableCount, TargetId, TermRecord, TermRelationshipRecord,
    TermTaxonomyRecord, Translation, Upserted, UserRecord,
};

use crate::postgres::{CLEAR_ORDER, ContentTables};
use crate::{LegacySource, LegacySourceError, TargetStore, TargetStoreError};

/// The rows served by a `MockLegacySource`. Order does not matter; the mock
/// sorts by primary key like the real reader.
#[derive(Debug, Clone, Default)]
pub struct LegacySnapshot {
    pub users: Vec<LegacyUser>,
    pub user_meta: Vec<LegacyMeta>,
    pub posts: Vec<LegacyPost>,
    pub post_meta: Vec<LegacyMeta>,
    pub terms: Vec<LegacyTerm>,
    pub term_taxonomies: Vec<LegacyTermTaxonomy>,
    pub term_relationships: Vec<LegacyTermRelationship>,
    pub comments: Vec<LegacyComment>,
    pub comment_meta: Vec<LegacyMeta>,
    pub options: Vec<LegacyOption>,
}

/// Mock legacy source backed by a `LegacySnapshot`.
pub struct MockLegacySource {
    snapshot: LegacySnapshot,
}

impl MockLegacySource {
    pub fn new(mut snapshot: LegacySnapshot) -> Self {
        snapshot.users.sort_by_key(|u| u.id);
        snapshot.user_meta.sort_by_key(|m| m.meta_id);
        snapshot.posts.sort_by_key(|p| p.id);
        snapshot.post_meta.sort_by_key(|m| m.meta_id);
        snapshot.terms.sort_by_key(|t| t.id);
        snapshot.term_taxonomies.sort_by_key(|t| t.id);
        snapshot
            .term_relationships
            .sort_by_key(|r| (r.object_id, r.term_taxonomy_id));
        snapshot.comments.sort_by_key(|c| c.id);
        snapshot.comment_meta.sort_by_key(|m| m.meta_id);
        snapshot.options.sort_by_key(|o| o.id);
        Self { snapshot }
    }

    fn meta_of(rows: &[LegacyMeta], owner_id: LegacyId) -> Vec<LegacyMeta> {
        rows.iter().filter(|m| m.owner_id == owner_id).cloned().collect()
    }

    fn first_post_meta(&self, post_id: LegacyId, key: &str) -> Option<String> {
        self.snapshot
            .post_meta
            .iter()
            .find(|m| m.owner_id == post_id && m.key == key)
            .and_then(|m| m.value.clone())
    }
}

#[async_trait]
impl LegacySource for MockLegacySource {
    async fn find_users(&self) -> Result<Vec<LegacyUser>, LegacySourceError> {
        Ok(self.snapshot.users.clone())
    }

    async fn find_user_meta(&self, user_id: LegacyId) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        Ok(Self::meta_of(&self.snapshot.user_meta, user_id))
    }

    async fn find_posts_by_types(
        &self,
        post_types: &[String],
    ) -> Result<Vec<LegacyPost>, LegacySourceError> {
        Ok(self
            .snapshot
            .posts
            .iter()
            .filter(|p| post_types.contains(&p.post_type))
            .cloned()
            .collect())
    }

    async fn find_post(&self, id: LegacyId) -> Result<Option<LegacyPost>, LegacySourceError> {
        Ok(self.snapshot.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_posts_by_ids(&self, ids: &[LegacyId]) -> Result<Vec<LegacyPost>, LegacySourceError> {
        Ok(self
            .snapshot
            .posts
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_post_meta(&self, post_id: LegacyId) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        Ok(Self::meta_of(&self.snapshot.post_meta, post_id))
    }

    async fn find_post_meta_by_key(&self, key: &str) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        Ok(self
            .snapshot
            .post_meta
            .iter()
            .filter(|m| m.key == key)
            .cloned()
            .collect())
    }

    async fn find_terms(&self) -> Result<Vec<LegacyTerm>, LegacySourceError> {
        Ok(self.snapshot.terms.clone())
    }

    async fn find_term(&self, id: LegacyId) -> Result<Option<LegacyTerm>, LegacySourceError> {
        Ok(self.snapshot.terms.iter().find(|t| t.id == id).cloned())
    }

    async fn find_term_taxonomies(&self) -> Result<Vec<LegacyTermTaxonomy>, LegacySourceError> {
        Ok(self.snapshot.term_taxonomies.clone())
    }

    async fn find_term_taxonomy(
        &self,
        id: LegacyId,
    ) -> Result<Option<LegacyTermTaxonomy>, LegacySourceError> {
        Ok(self.snapshot.term_taxonomies.iter().find(|t| t.id == id).cloned())
    }

    async fn find_term_taxonomies_by_kind(
        &self,
        kind: &str,
    ) -> Result<Vec<LegacyTermTaxonomy>, LegacySourceError> {
        Ok(self
            .snapshot
            .term_taxonomies
            .iter()
            .filter(|t| t.taxonomy == kind)
            .cloned()
            .collect())
    }

    async fn find_term_relationships(&self) -> Result<Vec<LegacyTermRelationship>, LegacySourceError> {
        Ok(self.snapshot.term_relationships.clone())
    }

    async fn find_term_relationships_by_taxonomy(
        &self,
        term_taxonomy_id: LegacyId,
    ) -> Result<Vec<LegacyTermRelationship>, LegacySourceError> {
        Ok(self
            .snapshot
            .term_relationships
            .iter()
            .filter(|r| r.term_taxonomy_id == term_taxonomy_id)
            .cloned()
            .collect())
    }

    async fn find_comments(&self) -> Result<Vec<LegacyComment>, LegacySourceError> {
        Ok(self.snapshot.comments.clone())
    }

    async fn find_comment_meta(
        &self,
        comment_id: LegacyId,
    ) -> Result<Vec<LegacyMeta>, LegacySourceError> {
        Ok(Self::meta_of(&self.snapshot.comment_meta, comment_id))
    }

    async fn find_options(&self) -> Result<Vec<LegacyOption>, LegacySourceError> {
        Ok(self.snapshot.options.clone())
    }

    async fn find_attachments(&self) -> Result<Vec<LegacyAttachment>, LegacySourceError> {
        Ok(self
            .snapshot
            .posts
            .iter()
            .filter(|p| p.post_type == "attachment")
            .map(|p| LegacyAttachment {
                id: p.id,
                title: p.title.clone(),
                caption: p.excerpt.clone(),
                mime_type: p.mime_type.clone(),
                attached_file: self.first_post_meta(p.id, "_wp_attached_file"),
                alt: self.first_post_meta(p.id, "_wp_attachment_image_alt"),
            })
            .collect())
    }
}

/// Rows of one mock table with a serial primary key.
#[derive(Debug, Clone)]
struct Table<T> {
    rows: BTreeMap<TargetId, T>,
    next_id: TargetId,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, row: T) -> TargetId {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, row);
        id
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<TargetId> {
        self.rows
            .iter()
            .find(|(_, row)| predicate(row))
            .map(|(id, _)| *id)
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

/// A row that may be linked to a parent row of the same table.
#[derive(Debug, Clone)]
pub struct Nested<T> {
    pub record: T,
    pub parent_id: Option<TargetId>,
}

impl<T> Nested<T> {
    fn root(record: T) -> Self {
        Self {
            record,
            parent_id: None,
        }
    }
}

#[derive(Debug, Clone)]
struct OwnedMeta {
    owner_id: TargetId,
    entry: MetaEntry,
}

#[derive(Debug, Default)]
struct MockState {
    users: Table<UserRecord>,
    user_meta: Table<OwnedMeta>,
    content: BTreeMap<ContentFamily, Table<Nested<ContentRecord>>>,
    translations: BTreeMap<ContentFamily, Table<OwnedMeta>>,
    content_meta: BTreeMap<ContentFamily, Table<OwnedMeta>>,
    terms: Table<TermRecord>,
    term_taxonomies: Table<Nested<TermTaxonomyRecord>>,
    term_relationships: Table<TermRelationshipRecord>,
    comments: Table<Nested<CommentRecord>>,
    comment_meta: Table<OwnedMeta>,
    media: Table<MediaRecord>,
    media_sizes: Table<MediaSizeRecord>,
    menus: Table<MenuRecord>,
    menu_items: Table<Nested<MenuItemRecord>>,
    settings: Table<SettingRecord>,
}

impl MockState {
    fn content_mut(&mut self, family: ContentFamily) -> &mut Table<Nested<ContentRecord>> {
        self.content.entry(family).or_default()
    }

    fn row_count(&self, table: &str) -> usize {
        let family_len = |tables: &BTreeMap<ContentFamily, Table<OwnedMeta>>, family: ContentFamily| {
            tables.get(&family).map_or(0, |t| t.rows.len())
        };
        for family in ContentFamily::ALL {
            let names = ContentTables::of(family);
            if table == names.content {
                return self.content.get(&family).map_or(0, |t| t.rows.len());
            }
            if table == names.translations {
                return family_len(&self.translations, family);
            }
            if table == names.meta {
                return family_len(&self.content_meta, family);
            }
        }
        match table {
            "cms_users" => self.users.rows.len(),
            "cms_user_meta" => self.user_meta.rows.len(),
            "cms_terms" => self.terms.rows.len(),
            "cms_term_taxonomies" => self.term_taxonomies.rows.len(),
            "cms_term_relationships" => self.term_relationships.rows.len(),
            "cms_comments" => self.comments.rows.len(),
            "cms_comment_meta" => self.comment_meta.rows.len(),
            "cms_media" => self.media.rows.len(),
            "cms_media_sizes" => self.media_sizes.rows.len(),
            "cms_menus" => self.menus.rows.len(),
            "cms_menu_items" => self.menu_items.rows.len(),
            "cms_settings" => self.settings.rows.len(),
            _ => 0,
        }
    }
}

/// Inserts meta rows, skipping keys the owner already has.
fn insert_meta(table: &mut Table<OwnedMeta>, owner_id: TargetId, entries: &[MetaEntry]) {
    for entry in entries {
        let exists = table
            .find(|m| m.owner_id == owner_id && m.entry.key == entry.key)
            .is_some();
        if !exists {
            table.insert(OwnedMeta {
                owner_id,
                entry: entry.clone(),
            });
        }
    }
}

fn set_parent<T>(
    table: &mut Table<Nested<T>>,
    name: &'static str,
    id: TargetId,
    parent_id: Option<TargetId>,
) -> Result<(), TargetStoreError> {
    let row = table
        .rows
        .get_mut(&id)
        .ok_or(TargetStoreError::NotFound { table: name, id })?;
    row.parent_id = parent_id;
    Ok(())
}

/// Mock target store keeping every CMS table in memory.
#[derive(Default)]
pub struct MockTargetStore {
    state: RwLock<MockState>,
}

impl MockTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Users with their surrogate ids.
    pub fn users(&self) -> Vec<(TargetId, UserRecord)> {
        let state = self.state.read().unwrap();
        state.users.rows.iter().map(|(id, u)| (*id, u.clone())).collect()
    }

    pub fn user_meta(&self, user_id: TargetId) -> Vec<MetaEntry> {
        let state = self.state.read().unwrap();
        state
            .user_meta
            .rows
            .values()
            .filter(|m| m.owner_id == user_id)
            .map(|m| m.entry.clone())
            .collect()
    }

    /// Content rows of one family with their ids and parent links.
    pub fn content(&self, family: ContentFamily) -> Vec<(TargetId, Nested<ContentRecord>)> {
        let state = self.state.read().unwrap();
        state
            .content
            .get(&family)
            .map(|t| t.rows.iter().map(|(id, c)| (*id, c.clone())).collect())
            .unwrap_or_default()
    }

    pub fn content_meta(&self, content: ContentRef) -> Vec<MetaEntry> {
        let state = self.state.read().unwrap();
        state
            .content_meta
            .get(&content.family)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|m| m.owner_id == content.id)
                    .map(|m| m.entry.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn terms(&self) -> Vec<(TargetId, TermRecord)> {
        let state = self.state.read().unwrap();
        state.terms.rows.iter().map(|(id, t)| (*id, t.clone())).collect()
    }

    pub fn term_taxonomies(&self) -> Vec<(TargetId, Nested<TermTaxonomyRecord>)> {
        let state = self.state.read().unwrap();
        state
            .term_taxonomies
            .rows
            .iter()
            .map(|(id, t)| (*id, t.clone()))
            .collect()
    }

    pub fn term_relationships(&self) -> Vec<TermRelationshipRecord> {
        let state = self.state.read().unwrap();
        state.term_relationships.rows.values().copied().collect()
    }

    pub fn comments(&self) -> Vec<(TargetId, Nested<CommentRecord>)> {
        let state = self.state.read().unwrap();
        state.comments.rows.iter().map(|(id, c)| (*id, c.clone())).collect()
    }

    pub fn media(&self) -> Vec<(TargetId, MediaRecord)> {
        let state = self.state.read().unwrap();
        state.media.rows.iter().map(|(id, m)| (*id, m.clone())).collect()
    }

    pub fn media_sizes(&self) -> Vec<MediaSizeRecord> {
        let state = self.state.read().unwrap();
        state.media_sizes.rows.values().cloned().collect()
    }

    pub fn menus(&self) -> Vec<(TargetId, MenuRecord)> {
        let state = self.state.read().unwrap();
        state.menus.rows.iter().map(|(id, m)| (*id, m.clone())).collect()
    }

    pub fn menu_items(&self) -> Vec<(TargetId, Nested<MenuItemRecord>)> {
        let state = self.state.read().unwrap();
        state
            .menu_items
            .rows
            .iter()
            .map(|(id, m)| (*id, m.clone()))
            .collect()
    }

    pub fn settings(&self) -> Vec<SettingRecord> {
        let state = self.state.read().unwrap();
        state.settings.rows.values().cloned().collect()
    }

    /// Inserts a media row directly, bypassing the media pipeline.
    pub fn seed_media(&self, media: MediaRecord) -> TargetId {
        self.state.write().unwrap().media.insert(media)
    }
}

#[async_trait]
impl TargetStore for MockTargetStore {
    async fn clear_all(&self) -> Result<(), TargetStoreError> {
        let mut state = self.state.write().unwrap();
        state.term_relationships.clear();
        state.comment_meta.clear();
        state.comments.clear();
        state.term_taxonomies.clear();
        state.terms.clear();
        state.menu_items.clear();
        state.menus.clear();
        state.content_meta.values_mut().for_each(Table::clear);
        state.media_sizes.clear();
        state.media.clear();
        state.translations.values_mut().for_each(Table::clear);
        state.content.values_mut().for_each(Table::clear);
        state.user_meta.clear();
        state.users.clear();
        state.settings.clear();
        Ok(())
    }

    async fn persist_user(
        &self,
        user: &UserRecord,
        meta: &[MetaEntry],
    ) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let upserted = match state.users.find(|u| u.email == user.email) {
            Some(id) => {
                state.users.rows.insert(id, user.clone());
                Upserted::updated(id)
            }
            None => Upserted::created(state.users.insert(user.clone())),
        };
        insert_meta(&mut state.user_meta, upserted.id, meta);
        Ok(upserted)
    }

    async fn persist_content(
        &self,
        content: &ContentRecord,
        meta: &[MetaEntry],
    ) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let family = content.family;
        let table = state.content_mut(family);
        let upserted = match table.find(|c| c.record.slug == content.slug) {
            Some(id) => {
                if let Some(row) = table.rows.get_mut(&id) {
                    row.record = content.clone();
                }
                Upserted::updated(id)
            }
            None => Upserted::created(table.insert(Nested::root(content.clone()))),
        };

        // Translations are stored as meta-shaped rows keyed by language.
        let translations = state.translations.entry(family).or_default();
        let language = content.translation.language.clone();
        let translation = translation_entry(&content.translation);
        match translations.find(|t| t.owner_id == upserted.id && t.entry.key == language) {
            Some(id) => {
                translations.rows.insert(
                    id,
                    OwnedMeta {
                        owner_id: upserted.id,
                        entry: translation,
                    },
                );
            }
            None => {
                translations.insert(OwnedMeta {
                    owner_id: upserted.id,
                    entry: translation,
                });
            }
        }

        insert_meta(state.content_meta.entry(family).or_default(), upserted.id, meta);
        Ok(upserted)
    }

    async fn find_content_by_slug(
        &self,
        family: ContentFamily,
        slug: &str,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(state
            .content
            .get(&family)
            .and_then(|t| t.find(|c| c.record.slug == slug)))
    }

    async fn set_page_parent(
        &self,
        page_id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        let mut state = self.state.write().unwrap();
        set_parent(state.content_mut(ContentFamily::Page), "cms_pages", page_id, parent_id)
    }

    async fn upsert_content_meta(
        &self,
        content: ContentRef,
        entry: &MetaEntry,
    ) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let table = state.content_meta.entry(content.family).or_default();
        let row = OwnedMeta {
            owner_id: content.id,
            entry: entry.clone(),
        };
        match table.find(|m| m.owner_id == content.id && m.entry.key == entry.key) {
            Some(id) => {
                table.rows.insert(id, row);
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(table.insert(row))),
        }
    }

    async fn upsert_term(&self, term: &TermRecord) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        match state.terms.find(|t| t.slug == term.slug) {
            Some(id) => {
                state.terms.rows.insert(id, term.clone());
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(state.terms.insert(term.clone()))),
        }
    }

    async fn find_term_by_slug(&self, slug: &str) -> Result<Option<TargetId>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(state.terms.find(|t| t.slug == slug))
    }

    async fn upsert_term_taxonomy(
        &self,
        taxonomy: &TermTaxonomyRecord,
    ) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let existing = state.term_taxonomies.find(|t| {
            t.record.term_id == taxonomy.term_id && t.record.taxonomy == taxonomy.taxonomy
        });
        match existing {
            Some(id) => {
                state
                    .term_taxonomies
                    .rows
                    .insert(id, Nested::root(taxonomy.clone()));
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(
                state.term_taxonomies.insert(Nested::root(taxonomy.clone())),
            )),
        }
    }

    async fn find_term_taxonomy(
        &self,
        term_id: TargetId,
        taxonomy: &str,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(state
            .term_taxonomies
            .find(|t| t.record.term_id == term_id && t.record.taxonomy == taxonomy))
    }

    async fn set_term_taxonomy_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        let mut state = self.state.write().unwrap();
        set_parent(&mut state.term_taxonomies, "cms_term_taxonomies", id, parent_id)
    }

    async fn insert_term_relationship(
        &self,
        relationship: &TermRelationshipRecord,
    ) -> Result<bool, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let exists = state
            .term_relationships
            .find(|r| {
                r.term_taxonomy_id == relationship.term_taxonomy_id
                    && r.content == relationship.content
            })
            .is_some();
        if exists {
            return Ok(false);
        }
        state.term_relationships.insert(*relationship);
        Ok(true)
    }

    async fn persist_comment(
        &self,
        comment: &CommentRecord,
        meta: &[MetaEntry],
    ) -> Result<TargetId, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let id = state.comments.insert(Nested::root(comment.clone()));
        insert_meta(&mut state.comment_meta, id, meta);
        Ok(id)
    }

    async fn set_comment_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        let mut state = self.state.write().unwrap();
        set_parent(&mut state.comments, "cms_comments", id, parent_id)
    }

    async fn upsert_media(&self, media: &MediaRecord) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let existing = state.media.find(|m| {
            m.path == media.path
                || (media.wp_attachment_id.is_some() && m.wp_attachment_id == media.wp_attachment_id)
        });
        match existing {
            Some(id) => {
                if let Some(row) = state.media.rows.get_mut(&id) {
                    let previous = row.clone();
                    *row = media.clone();
                    row.wp_attachment_id = media.wp_attachment_id.or(previous.wp_attachment_id);
                    row.alt = media.alt.clone().or(previous.alt);
                    row.title = media.title.clone().or(previous.title);
                    row.caption = media.caption.clone().or(previous.caption);
                }
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(state.media.insert(media.clone()))),
        }
    }

    async fn upsert_media_size(&self, size: &MediaSizeRecord) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        if !state.media.rows.contains_key(&size.media_id) {
            return Err(TargetStoreError::NotFound {
                table: "cms_media",
                id: size.media_id,
            });
        }
        match state
            .media_sizes
            .find(|s| s.media_id == size.media_id && s.name == size.name)
        {
            Some(id) => {
                state.media_sizes.rows.insert(id, size.clone());
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(state.media_sizes.insert(size.clone()))),
        }
    }

    async fn find_media_by_attachment_id(
        &self,
        attachment_id: i64,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(state
            .media
            .find(|m| m.wp_attachment_id == Some(attachment_id)))
    }

    async fn find_media_by_path(&self, path: &str) -> Result<Option<TargetId>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(state.media.find(|m| m.path == path))
    }

    async fn find_media_by_filename(
        &self,
        fragment: &str,
    ) -> Result<Option<TargetId>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(state.media.find(|m| m.path.contains(fragment)))
    }

    async fn upsert_menu(&self, menu: &MenuRecord) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        match state.menus.find(|m| m.name == menu.name) {
            Some(id) => {
                state.menus.rows.insert(id, menu.clone());
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(state.menus.insert(menu.clone()))),
        }
    }

    async fn clear_menu_items(&self, menu_id: TargetId) -> Result<u64, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        let before = state.menu_items.rows.len();
        state.menu_items.rows.retain(|_, item| item.record.menu_id != menu_id);
        Ok((before - state.menu_items.rows.len()) as u64)
    }

    async fn insert_menu_item(&self, item: &MenuItemRecord) -> Result<TargetId, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        Ok(state.menu_items.insert(Nested::root(item.clone())))
    }

    async fn set_menu_item_parent(
        &self,
        id: TargetId,
        parent_id: Option<TargetId>,
    ) -> Result<(), TargetStoreError> {
        let mut state = self.state.write().unwrap();
        set_parent(&mut state.menu_items, "cms_menu_items", id, parent_id)
    }

    async fn upsert_setting(&self, setting: &SettingRecord) -> Result<Upserted, TargetStoreError> {
        let mut state = self.state.write().unwrap();
        match state.settings.find(|s| s.key == setting.key) {
            Some(id) => {
                state.settings.rows.insert(id, setting.clone());
                Ok(Upserted::updated(id))
            }
            None => Ok(Upserted::created(state.settings.insert(setting.clone()))),
        }
    }

    async fn table_counts(&self) -> Result<Vec<TableCount>, TargetStoreError> {
        let state = self.state.read().unwrap();
        Ok(CLEAR_ORDER
            .iter()
            .rev()
            .map(|table| TableCount {
                table: table.to_string(),
                rows: state.row_count(table) as i64,
            })
            .collect())
    }
}

fn translation_entry(translation: &Translation) -> MetaEntry {
    MetaEntry::new(
        translation.language.clone(),
        serde_json::json!({
            "title": translation.title,
            "content": translation.content,
            "excerpt": translation.excerpt,
        }),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cms_migrate_shared::types::{ContentStatus, UserRole};

    use super::*;

    fn page(slug: &str) -> ContentRecord {
        ContentRecord {
            family: ContentFamily::Page,
            slug: slug.to_string(),
            status: ContentStatus::Published,
            author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            menu_order: 0,
            price: None,
            translation: Translation {
                language: "de".to_string(),
                title: "Title".to_string(),
                content: String::new(),
                excerpt: String::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_persist_content_upserts_by_slug() {
        let store = MockTargetStore::new();
        let meta = vec![MetaEntry::new("k", serde_json::json!({"raw": "v"}))];

        let first = store.persist_content(&page("about"), &meta).await.unwrap();
        let second = store.persist_content(&page("about"), &meta).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(store.content(ContentFamily::Page).len(), 1);
        assert_eq!(
            store
                .content_meta(ContentRef::new(ContentFamily::Page, first.id))
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_persist_user_upserts_by_email() {
        let store = MockTargetStore::new();
        let user = UserRecord {
            login: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "$P$hash".to_string(),
            display_name: "Admin".to_string(),
            role: UserRole::Superadmin,
            is_active: true,
            registered_at: Utc::now(),
        };

        store.persist_user(&user, &[]).await.unwrap();
        let again = store.persist_user(&user, &[]).await.unwrap();

        assert!(!again.created);
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_empties_every_table() {
        let store = MockTargetStore::new();
        store.persist_content(&page("a"), &[]).await.unwrap();
        store
            .upsert_setting(&SettingRecord {
                key: "blogname".to_string(),
                value: serde_json::json!("Site"),
            })
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        let counts = store.table_counts().await.unwrap();
        assert_eq!(counts.len(), CLEAR_ORDER.len());
        assert!(counts.iter().all(|c| c.rows == 0));
    }

    #[tokio::test]
    async fn test_find_attachments_joins_file_meta() {
        let legacy = MockLegacySource::new(LegacySnapshot {
            posts: vec![LegacyPost {
                id: 5,
                post_type: "attachment".to_string(),
                title: "Photo".to_string(),
                ..Default::default()
            }],
            post_meta: vec![LegacyMeta {
                meta_id: 1,
                owner_id: 5,
                key: "_wp_attached_file".to_string(),
                value: Some("2021/05/photo.jpg".to_string()),
            }],
            ..Default::default()
        });

        let attachments = legacy.find_attachments().await.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].attached_file.as_deref(), Some("2021/05/photo.jpg"));
        assert_eq!(attachments[0].alt, None);
    }
}

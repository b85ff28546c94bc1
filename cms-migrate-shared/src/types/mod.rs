mod comment;
mod content;
mod legacy;
mod media;
mod menu;
mod meta;
mod setting;
mod taxonomy;
mod user;

pub use comment::{CommentRecord, CommentStatus};
pub use content::{ContentFamily, ContentRecord, ContentRef, ContentStatus, Translation};
pub use legacy::{
    LegacyAttachment, LegacyComment, LegacyId, LegacyMeta, LegacyOption, LegacyPost, LegacyTerm,
    LegacyTermRelationship, LegacyTermTaxonomy, LegacyUser,
};
pub use media::{MediaRecord, MediaSizeRecord};
pub use menu::{MenuItemRecord, MenuRecord};
pub use meta::MetaEntry;
pub use setting::SettingRecord;
pub use taxonomy::{TermRecord, TermRelationshipRecord, TermTaxonomyRecord};
pub use user::{ParseRoleError, UserRecord, UserRole};

/// Surrogate primary key assigned by the target schema.
pub type TargetId = i32;

/// Result of an upsert against the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub id: TargetId,
    /// `true` when the row was inserted, `false` when an existing row was updated.
    pub created: bool,
}

impl Upserted {
    pub fn created(id: TargetId) -> Self {
        Self { id, created: true }
    }

    pub fn updated(id: TargetId) -> Self {
        Self { id, created: false }
    }
}

/// Row count of a single target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

use crate::types::{ContentRef, TargetId};

/// A term row, unique by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    pub slug: String,
    pub name: String,
    pub group: i64,
}

/// A taxonomy row, unique by (term id, taxonomy kind). Created without a
/// parent; parent links are wired in a second pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermTaxonomyRecord {
    pub term_id: TargetId,
    pub taxonomy: String,
    pub description: String,
    pub count: i64,
}

/// Join between a taxonomy row and exactly one content row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermRelationshipRecord {
    pub term_taxonomy_id: TargetId,
    pub content: ContentRef,
    pub term_order: i32,
}

//! Legacy id → surrogate id maps, one per entity family.
//!
//! The resolver is created empty at the start of a run, filled by each phase
//! and read by the phases that depend on it. It is owned by the orchestrator
//! and lent to migrators; nothing in it outlives the run.
use std::collections::{BTreeMap, HashMap};

use cms_migrate_shared::types::{ContentFamily, ContentRef, LegacyId, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityFamily {
    Users,
    Pages,
    Articles,
    Portfolios,
    Products,
    Media,
    MenuItems,
    Terms,
    TermTaxonomies,
    Comments,
}

impl From<ContentFamily> for EntityFamily {
    fn from(family: ContentFamily) -> Self {
        match family {
            ContentFamily::Page => EntityFamily::Pages,
            ContentFamily::Article => EntityFamily::Articles,
            ContentFamily::Portfolio => EntityFamily::Portfolios,
            ContentFamily::Product => EntityFamily::Products,
        }
    }
}

#[derive(Debug, Default)]
pub struct IdentityResolver {
    maps: HashMap<EntityFamily, BTreeMap<LegacyId, TargetId>>,
    slugs: HashMap<(ContentFamily, LegacyId), String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `legacy_id` of `family` was migrated to `new_id`.
    /// A later record for the same legacy id replaces the earlier one.
    pub fn record(&mut self, family: EntityFamily, legacy_id: LegacyId, new_id: TargetId) {
        self.maps.entry(family).or_default().insert(legacy_id, new_id);
    }

    /// Returns the surrogate id of a legacy row, or `None` when it was never migrated.
    pub fn lookup(&self, family: EntityFamily, legacy_id: LegacyId) -> Option<TargetId> {
        self.maps.get(&family)?.get(&legacy_id).copied()
    }

    /// Returns the surrogate id recorded for the lowest legacy id of `family`.
    pub fn first(&self, family: EntityFamily) -> Option<TargetId> {
        self.maps.get(&family)?.values().next().copied()
    }

    /// Looks a legacy post up across every content family.
    pub fn lookup_content(&self, legacy_id: LegacyId) -> Option<ContentRef> {
        ContentFamily::ALL.into_iter().find_map(|family| {
            self.lookup(family.into(), legacy_id)
                .map(|id| ContentRef::new(family, id))
        })
    }

    /// Records the slug a content item was stored under.
    pub fn record_slug(&mut self, family: ContentFamily, legacy_id: LegacyId, slug: String) {
        self.slugs.insert((family, legacy_id), slug);
    }

    pub fn slug(&self, family: ContentFamily, legacy_id: LegacyId) -> Option<&str> {
        self.slugs.get(&(family, legacy_id)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_absent_is_none() {
        let resolver = IdentityResolver::new();
        assert_eq!(resolver.lookup(EntityFamily::Users, 1), None);
        assert_eq!(resolver.first(EntityFamily::Users), None);
    }

    #[test]
    fn test_families_are_independent() {
        let mut resolver = IdentityResolver::new();
        resolver.record(EntityFamily::Pages, 10, 1);
        resolver.record(EntityFamily::Articles, 10, 2);

        assert_eq!(resolver.lookup(EntityFamily::Pages, 10), Some(1));
        assert_eq!(resolver.lookup(EntityFamily::Articles, 10), Some(2));
        assert_eq!(resolver.lookup(EntityFamily::Media, 10), None);
    }

    #[test]
    fn test_first_uses_lowest_legacy_id() {
        let mut resolver = IdentityResolver::new();
        resolver.record(EntityFamily::Users, 7, 70);
        resolver.record(EntityFamily::Users, 3, 30);
        assert_eq!(resolver.first(EntityFamily::Users), Some(30));
    }

    #[test]
    fn test_lookup_content_reports_family() {
        let mut resolver = IdentityResolver::new();
        resolver.record(EntityFamily::Portfolios, 5, 9);
        assert_eq!(
            resolver.lookup_content(5),
            Some(ContentRef::new(ContentFamily::Portfolio, 9))
        );
        assert_eq!(resolver.lookup_content(6), None);
    }

    #[test]
    fn test_slugs_are_kept_per_family() {
        let mut resolver = IdentityResolver::new();
        resolver.record_slug(ContentFamily::Page, 42, "post-42-2".to_string());
        assert_eq!(resolver.slug(ContentFamily::Page, 42), Some("post-42-2"));
        assert_eq!(resolver.slug(ContentFamily::Article, 42), None);
    }
}

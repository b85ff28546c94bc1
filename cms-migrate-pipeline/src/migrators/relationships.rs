use std::collections::HashMap;

use cms_migrate_shared::types::{ContentRef, LegacyId, TargetId, TermRelationshipRecord};
use tracing::{debug, instrument, warn};

use crate::errors::MigrationError;
use crate::migrators::{MigrationContext, Migrator, clamp_i32, content_slug};
use crate::resolver::EntityFamily;
use crate::summary::{Phase, PhaseSummary};

/// Joins migrated content to migrated taxonomy rows.
///
/// The legacy join is polymorphic: the family of `object_id` is only known
/// after reading the referenced post. Rows whose taxonomy or content cannot be
/// resolved are dropped.
pub struct TermRelationshipsMigrator;

#[async_trait::async_trait]
impl Migrator for TermRelationshipsMigrator {
    fn phase(&self) -> Phase {
        Phase::TermRelationships
    }

    #[instrument(skip_all, fields(phase = "term_relationships"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::TermRelationships);
        let mut taxonomies: HashMap<LegacyId, Option<TargetId>> = HashMap::new();
        let mut objects: HashMap<LegacyId, Option<ContentRef>> = HashMap::new();

        for relationship in ctx.legacy.find_term_relationships().await? {
            let term_taxonomy_id = match taxonomies.get(&relationship.term_taxonomy_id) {
                Some(resolved) => *resolved,
                None => {
                    let resolved = resolve_taxonomy(ctx, relationship.term_taxonomy_id).await?;
                    taxonomies.insert(relationship.term_taxonomy_id, resolved);
                    resolved
                }
            };
            let content = match objects.get(&relationship.object_id) {
                Some(resolved) => *resolved,
                None => {
                    let resolved = resolve_object(ctx, relationship.object_id).await?;
                    objects.insert(relationship.object_id, resolved);
                    resolved
                }
            };

            let (Some(term_taxonomy_id), Some(content)) = (term_taxonomy_id, content) else {
                debug!(
                    object_id = relationship.object_id,
                    term_taxonomy_id = relationship.term_taxonomy_id,
                    "Dropping unresolvable relationship"
                );
                summary.skip();
                continue;
            };

            let record = TermRelationshipRecord {
                term_taxonomy_id,
                content,
                term_order: clamp_i32(relationship.term_order),
            };
            match ctx.target.insert_term_relationship(&record).await {
                Ok(true) => summary.created(),
                Ok(false) => summary.skip(),
                Err(e) => {
                    warn!(
                        legacy_id = relationship.object_id,
                        family = "term_relationships",
                        reason = %e,
                        "Failed to migrate term relationship"
                    );
                    summary.fail();
                }
            }
        }

        Ok(summary)
    }
}

/// Legacy taxonomy → legacy term → target term by slug → target taxonomy by
/// (term, kind). The resolver map is consulted first.
async fn resolve_taxonomy(
    ctx: &MigrationContext<'_>,
    legacy_id: LegacyId,
) -> Result<Option<TargetId>, MigrationError> {
    if let Some(id) = ctx.resolver.lookup(EntityFamily::TermTaxonomies, legacy_id) {
        return Ok(Some(id));
    }
    let Some(taxonomy) = ctx.legacy.find_term_taxonomy(legacy_id).await? else {
        return Ok(None);
    };
    let Some(term) = ctx.legacy.find_term(taxonomy.term_id).await? else {
        return Ok(None);
    };
    let Some(term_id) = ctx.target.find_term_by_slug(&term.slug).await? else {
        return Ok(None);
    };
    Ok(ctx.target.find_term_taxonomy(term_id, &taxonomy.taxonomy).await?)
}

/// Legacy post → content family by type tag → target row, through the
/// resolver or by slug. A post with no usable slug resolves to nothing.
pub(crate) async fn resolve_object(
    ctx: &MigrationContext<'_>,
    legacy_id: LegacyId,
) -> Result<Option<ContentRef>, MigrationError> {
    if let Some(content) = ctx.resolver.lookup_content(legacy_id) {
        return Ok(Some(content));
    }
    let Some(post) = ctx.legacy.find_post(legacy_id).await? else {
        return Ok(None);
    };
    let Some(family) = ctx.config.family_of(&post.post_type) else {
        return Ok(None);
    };
    let Some(slug) = content_slug(ctx.resolver, family, &post) else {
        return Ok(None);
    };
    Ok(ctx
        .target
        .find_content_by_slug(family, &slug)
        .await?
        .map(|id| ContentRef::new(family, id)))
}

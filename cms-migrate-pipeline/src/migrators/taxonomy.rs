use std::collections::HashMap;

use cms_migrate_shared::types::{
    LegacyId, LegacyTerm, LegacyTermTaxonomy, TargetId, TermRecord, TermTaxonomyRecord,
};
use tracing::{debug, info, instrument, warn};

use crate::errors::MigrationError;
use crate::hierarchy::ParentLinks;
use crate::migrators::{MigrationContext, Migrator};
use crate::resolver::EntityFamily;
use crate::summary::{Phase, PhaseSummary};

/// Migrates terms and taxonomy rows in two passes: flat rows first, parent
/// links second, so that parents are found regardless of scan order.
pub struct TaxonomyMigrator;

#[async_trait::async_trait]
impl Migrator for TaxonomyMigrator {
    fn phase(&self) -> Phase {
        Phase::Taxonomy
    }

    #[instrument(skip_all, fields(phase = "taxonomy"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Taxonomy);

        let terms = ctx.legacy.find_terms().await?;
        for term in &terms {
            let record = TermRecord {
                slug: term_slug(term),
                name: term.name.clone(),
                group: term.group,
            };
            match ctx.target.upsert_term(&record).await {
                Ok(upserted) => {
                    ctx.resolver.record(EntityFamily::Terms, term.id, upserted.id);
                    summary.record(upserted);
                }
                Err(e) => {
                    warn!(legacy_id = term.id, family = "terms", reason = %e, "Failed to migrate term");
                    summary.fail();
                }
            }
        }

        let taxonomies = ctx.legacy.find_term_taxonomies().await?;
        for taxonomy in &taxonomies {
            let Some(term_id) = ctx.resolver.lookup(EntityFamily::Terms, taxonomy.term_id) else {
                debug!(legacy_id = taxonomy.id, term_id = taxonomy.term_id, "Taxonomy term was not migrated");
                summary.skip();
                continue;
            };
            let record = TermTaxonomyRecord {
                term_id,
                taxonomy: taxonomy.taxonomy.clone(),
                description: taxonomy.description.clone(),
                count: taxonomy.count,
            };
            match ctx.target.upsert_term_taxonomy(&record).await {
                Ok(upserted) => {
                    ctx.resolver
                        .record(EntityFamily::TermTaxonomies, taxonomy.id, upserted.id);
                    summary.record(upserted);
                }
                Err(e) => {
                    warn!(legacy_id = taxonomy.id, family = "term_taxonomies", reason = %e, "Failed to migrate taxonomy");
                    summary.fail();
                }
            }
        }

        link_parents(ctx, &terms, &taxonomies).await?;
        Ok(summary)
    }
}

fn term_slug(term: &LegacyTerm) -> String {
    match term.slug.trim() {
        "" => format!("term-{}", term.id),
        slug => slug.to_string(),
    }
}

/// Second pass: legacy parent taxonomy → legacy term → target term by slug →
/// target taxonomy by (term, kind). Any miss leaves the child a root.
async fn link_parents(
    ctx: &mut MigrationContext<'_>,
    terms: &[LegacyTerm],
    taxonomies: &[LegacyTermTaxonomy],
) -> Result<(), MigrationError> {
    let terms_by_id: HashMap<LegacyId, &LegacyTerm> = terms.iter().map(|t| (t.id, t)).collect();
    let taxonomies_by_id: HashMap<LegacyId, &LegacyTermTaxonomy> =
        taxonomies.iter().map(|t| (t.id, t)).collect();

    let mut links = ParentLinks::new();
    let mut linked = 0u64;

    for taxonomy in taxonomies.iter().filter(|t| t.parent_id != 0) {
        let Some(child_id) = ctx.resolver.lookup(EntityFamily::TermTaxonomies, taxonomy.id) else {
            continue;
        };
        let Some(parent_id) = resolve_parent(ctx, taxonomy, &terms_by_id, &taxonomies_by_id).await?
        else {
            debug!(legacy_id = taxonomy.id, parent = taxonomy.parent_id, "Taxonomy parent unresolved, leaving root");
            continue;
        };
        if !links.link(child_id, parent_id) {
            warn!(legacy_id = taxonomy.id, family = "term_taxonomies", reason = "cycle", "Skipping taxonomy parent link");
            continue;
        }
        match ctx.target.set_term_taxonomy_parent(child_id, Some(parent_id)).await {
            Ok(()) => linked += 1,
            Err(e) => {
                warn!(legacy_id = taxonomy.id, family = "term_taxonomies", reason = %e, "Failed to link taxonomy parent")
            }
        }
    }

    info!(linked, "Linked taxonomy parents");
    Ok(())
}

async fn resolve_parent(
    ctx: &MigrationContext<'_>,
    taxonomy: &LegacyTermTaxonomy,
    terms_by_id: &HashMap<LegacyId, &LegacyTerm>,
    taxonomies_by_id: &HashMap<LegacyId, &LegacyTermTaxonomy>,
) -> Result<Option<TargetId>, MigrationError> {
    let Some(parent) = taxonomies_by_id.get(&taxonomy.parent_id) else {
        return Ok(None);
    };
    let Some(parent_term) = terms_by_id.get(&parent.term_id) else {
        return Ok(None);
    };
    let Some(term_id) = ctx.target.find_term_by_slug(&term_slug(parent_term)).await? else {
        return Ok(None);
    };
    Ok(ctx.target.find_term_taxonomy(term_id, &parent.taxonomy).await?)
}

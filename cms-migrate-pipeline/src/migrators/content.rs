use std::collections::HashSet;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use cms_migrate_shared::types::{
    ContentFamily, ContentRecord, ContentStatus, LegacyId, LegacyMeta, LegacyPost, TargetId,
    Translation,
};
use tracing::{debug, info, instrument, warn};

use crate::dates::normalize_timestamp;
use crate::errors::MigrationError;
use crate::hierarchy::ParentLinks;
use crate::meta::{find_value, meta_entries};
use crate::migrators::{MigrationContext, Migrator, clamp_i32};
use crate::resolver::{EntityFamily, IdentityResolver};
use crate::summary::{Phase, PhaseSummary};

const PRICE_KEYS: [&str; 2] = ["_price", "_regular_price"];

/// Slug assigned to a post whose legacy slug is blank.
fn fallback_slug(family: ContentFamily, legacy_id: LegacyId) -> String {
    match family {
        ContentFamily::Product => format!("product-{legacy_id}"),
        _ => format!("post-{legacy_id}"),
    }
}

/// The slug a legacy post is stored under: the one assigned during the
/// content phase, else its own non-blank slug.
pub(crate) fn content_slug(
    resolver: &IdentityResolver,
    family: ContentFamily,
    post: &LegacyPost,
) -> Option<String> {
    if let Some(slug) = resolver.slug(family, post.id) {
        return Some(slug.to_string());
    }
    let slug = post.slug.trim();
    (!slug.is_empty()).then(|| slug.to_string())
}

/// Slugs handed out during one content phase, per family.
///
/// Every non-blank legacy slug is reserved for its own post up front, so a
/// fallback or a duplicate never takes a slug a later post owns. Collisions
/// get a `-2`, `-3`, ... suffix in legacy id order.
#[derive(Debug, Default)]
struct SlugClaims {
    reserved: HashSet<(ContentFamily, String)>,
    claimed: HashSet<(ContentFamily, String)>,
}

impl SlugClaims {
    fn reserve(&mut self, family: ContentFamily, slug: &str) {
        let slug = slug.trim();
        if !slug.is_empty() {
            self.reserved.insert((family, slug.to_string()));
        }
    }

    fn claim(&mut self, family: ContentFamily, post: &LegacyPost) -> String {
        let own = post.slug.trim();
        let base = match own {
            "" => fallback_slug(family, post.id),
            slug => slug.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 1u32;
        loop {
            let key = (family, candidate);
            let taken = self.claimed.contains(&key)
                || (key.1 != own && self.reserved.contains(&key));
            if !taken {
                self.claimed.insert(key.clone());
                return key.1;
            }
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }
    }
}

/// Migrates pages, articles, portfolios and products, then links page parents.
pub struct ContentMigrator;

#[async_trait::async_trait]
impl Migrator for ContentMigrator {
    fn phase(&self) -> Phase {
        Phase::Content
    }

    #[instrument(skip_all, fields(phase = "content"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Content);
        let posts = ctx
            .legacy
            .find_posts_by_types(&ctx.config.content_post_types())
            .await?;

        let mut page_parents: Vec<(TargetId, LegacyId)> = Vec::new();

        let mut accepted = Vec::with_capacity(posts.len());
        for post in &posts {
            let Some(family) = ctx.config.family_of(&post.post_type) else {
                summary.skip();
                continue;
            };
            if ctx.config.is_excluded_status(&post.status) {
                debug!(legacy_id = post.id, status = %post.status, "Skipping post by status");
                summary.skip();
                continue;
            }
            if post.slug.trim().is_empty() && ctx.config.skip_blank_slugs {
                debug!(legacy_id = post.id, "Skipping post without slug");
                summary.skip();
                continue;
            }
            accepted.push((family, post));
        }

        let mut slugs = SlugClaims::default();
        for (family, post) in &accepted {
            slugs.reserve(*family, &post.slug);
        }

        for (family, post) in accepted {
            let slug = slugs.claim(family, post);
            if slug != post.slug.trim() && !post.slug.trim().is_empty() {
                warn!(legacy_id = post.id, family = %family, slug = %slug, reason = "duplicate slug", "Renamed content slug");
            }

            let meta_rows = ctx.legacy.find_post_meta(post.id).await?;
            let record = content_record(ctx, family, post, slug, &meta_rows);
            let meta = meta_entries(&meta_rows);

            match ctx.target.persist_content(&record, &meta).await {
                Ok(upserted) => {
                    debug!(legacy_id = post.id, id = upserted.id, family = %family, slug = %record.slug, "Content migrated");
                    ctx.resolver.record(family.into(), post.id, upserted.id);
                    ctx.resolver.record_slug(family, post.id, record.slug.clone());
                    if family == ContentFamily::Page && post.parent_id != 0 {
                        page_parents.push((upserted.id, post.parent_id));
                    }
                    summary.record(upserted);
                }
                Err(e) => {
                    warn!(legacy_id = post.id, family = %family, reason = %e, "Failed to migrate content");
                    summary.fail();
                }
            }
        }

        link_page_parents(ctx, &page_parents).await;
        Ok(summary)
    }
}

fn content_record(
    ctx: &MigrationContext<'_>,
    family: ContentFamily,
    post: &LegacyPost,
    slug: String,
    meta_rows: &[LegacyMeta],
) -> ContentRecord {
    let author_id = ctx
        .resolver
        .lookup(EntityFamily::Users, post.author_id)
        .or_else(|| ctx.resolver.first(EntityFamily::Users));
    let price = match family {
        ContentFamily::Product => parse_price(meta_rows),
        _ => None,
    };

    ContentRecord {
        family,
        slug,
        status: ContentStatus::from_legacy(&post.status),
        author_id,
        created_at: normalize_timestamp(post.created_at.as_deref(), ctx.now),
        updated_at: normalize_timestamp(post.modified_at.as_deref(), ctx.now),
        menu_order: clamp_i32(post.menu_order),
        price,
        translation: Translation {
            language: ctx.config.default_language.clone(),
            title: post.title.trim().to_string(),
            content: ctx.sanitizer.sanitize(&post.content),
            excerpt: ctx.sanitizer.sanitize(&post.excerpt),
        },
    }
}

fn parse_price(meta_rows: &[LegacyMeta]) -> Option<BigDecimal> {
    PRICE_KEYS.iter().find_map(|key| {
        let raw = find_value(meta_rows, key)?.trim().replace(',', ".");
        BigDecimal::from_str(&raw).ok()
    })
}

async fn link_page_parents(ctx: &MigrationContext<'_>, page_parents: &[(TargetId, LegacyId)]) {
    let mut links = ParentLinks::new();
    let mut linked = 0u64;

    for (page_id, legacy_parent) in page_parents {
        let Some(parent_id) = ctx.resolver.lookup(EntityFamily::Pages, *legacy_parent) else {
            debug!(page_id, legacy_parent, "Page parent was not migrated");
            continue;
        };
        if !links.link(*page_id, parent_id) {
            warn!(page_id, parent_id, family = "pages", reason = "cycle", "Skipping page parent link");
            continue;
        }
        match ctx.target.set_page_parent(*page_id, Some(parent_id)).await {
            Ok(()) => linked += 1,
            Err(e) => warn!(page_id, parent_id, family = "pages", reason = %e, "Failed to link page parent"),
        }
    }

    if linked > 0 {
        info!(linked, "Linked page parents");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(key: &str, value: &str) -> LegacyMeta {
        LegacyMeta {
            key: key.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_fallback_slug_per_family() {
        assert_eq!(fallback_slug(ContentFamily::Page, 42), "post-42");
        assert_eq!(fallback_slug(ContentFamily::Article, 7), "post-7");
        assert_eq!(fallback_slug(ContentFamily::Product, 7), "product-7");
    }

    fn post(id: LegacyId, slug: &str) -> LegacyPost {
        LegacyPost {
            id,
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fallback_slug_avoids_reserved_slug() {
        let real = post(7, "post-42");
        let blank = post(42, "");
        let mut claims = SlugClaims::default();
        claims.reserve(ContentFamily::Page, &real.slug);
        claims.reserve(ContentFamily::Page, &blank.slug);

        assert_eq!(claims.claim(ContentFamily::Page, &blank), "post-42-2");
        assert_eq!(claims.claim(ContentFamily::Page, &real), "post-42");
    }

    #[test]
    fn test_duplicate_slugs_are_suffixed_per_family() {
        let mut claims = SlugClaims::default();
        claims.reserve(ContentFamily::Article, "news");
        claims.reserve(ContentFamily::Page, "news");
        assert_eq!(claims.claim(ContentFamily::Article, &post(1, "news")), "news");
        assert_eq!(claims.claim(ContentFamily::Article, &post(2, "news")), "news-2");
        assert_eq!(claims.claim(ContentFamily::Page, &post(3, "news")), "news");
    }

    #[test]
    fn test_content_slug_prefers_assigned_slug() {
        let mut resolver = IdentityResolver::new();
        assert_eq!(content_slug(&resolver, ContentFamily::Page, &post(42, "")), None);
        assert_eq!(
            content_slug(&resolver, ContentFamily::Page, &post(7, " about ")),
            Some("about".to_string())
        );
        resolver.record_slug(ContentFamily::Page, 42, "post-42-2".to_string());
        assert_eq!(
            content_slug(&resolver, ContentFamily::Page, &post(42, "")),
            Some("post-42-2".to_string())
        );
    }

    #[test]
    fn test_price_prefers_active_price() {
        let rows = vec![meta("_regular_price", "20"), meta("_price", "15.50")];
        assert_eq!(parse_price(&rows), Some(BigDecimal::from_str("15.50").unwrap()));
    }

    #[test]
    fn test_price_falls_back_and_tolerates_garbage() {
        let rows = vec![meta("_price", ""), meta("_regular_price", "9,90")];
        assert_eq!(parse_price(&rows), Some(BigDecimal::from_str("9.90").unwrap()));
        assert_eq!(parse_price(&[meta("_price", "n/a")]), None);
        assert_eq!(parse_price(&[]), None);
    }
}

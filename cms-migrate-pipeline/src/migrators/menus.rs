use std::collections::HashMap;

use cms_migrate_shared::types::{
    ContentFamily, LegacyId, LegacyMeta, LegacyPost, LegacyTermTaxonomy, MenuItemRecord,
    MenuRecord, TargetId,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::errors::MigrationError;
use crate::hierarchy::ParentLinks;
use crate::meta::find_value;
use crate::migrators::{MigrationContext, Migrator, clamp_i32, content_slug};
use crate::php_serialized;
use crate::resolver::EntityFamily;
use crate::summary::{Phase, PhaseSummary};

const MENU_TAXONOMY: &str = "nav_menu";
const DEFAULT_TITLE: &str = "Menu Item";
const DEFAULT_TARGET: &str = "_self";

/// Rebuilds navigation menus from `nav_menu` taxonomy rows and their
/// `nav_menu_item` posts. Items are created flat, then nested.
pub struct MenusMigrator;

#[async_trait::async_trait]
impl Migrator for MenusMigrator {
    fn phase(&self) -> Phase {
        Phase::Menus
    }

    #[instrument(skip_all, fields(phase = "menus"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Menus);

        for taxonomy in ctx.legacy.find_term_taxonomies_by_kind(MENU_TAXONOMY).await? {
            migrate_menu(ctx, &taxonomy, &mut summary).await?;
        }

        Ok(summary)
    }
}

/// A legacy menu item with its meta resolved, before insertion.
#[derive(Debug)]
struct ItemDraft {
    legacy_id: LegacyId,
    legacy_parent: LegacyId,
    record: MenuItemRecord,
}

async fn migrate_menu(
    ctx: &mut MigrationContext<'_>,
    taxonomy: &LegacyTermTaxonomy,
    summary: &mut PhaseSummary,
) -> Result<(), MigrationError> {
    let Some(term) = ctx.legacy.find_term(taxonomy.term_id).await? else {
        warn!(legacy_id = taxonomy.id, family = "menus", reason = "missing term", "Skipping menu");
        summary.skip();
        return Ok(());
    };

    let menu = MenuRecord {
        name: term.name.clone(),
        location: term.slug.clone(),
    };
    let menu_id = match ctx.target.upsert_menu(&menu).await {
        Ok(upserted) => {
            summary.record(upserted);
            upserted.id
        }
        Err(e) => {
            warn!(legacy_id = taxonomy.id, family = "menus", reason = %e, "Failed to migrate menu");
            summary.fail();
            return Ok(());
        }
    };
    if let Err(e) = ctx.target.clear_menu_items(menu_id).await {
        warn!(menu_id, family = "menus", reason = %e, "Failed to clear menu items");
    }

    let item_ids: Vec<LegacyId> = ctx
        .legacy
        .find_term_relationships_by_taxonomy(taxonomy.id)
        .await?
        .into_iter()
        .map(|relationship| relationship.object_id)
        .collect();
    let items = ctx.legacy.find_posts_by_ids(&item_ids).await?;

    let mut drafts = Vec::with_capacity(items.len());
    for item in &items {
        let meta = ctx.legacy.find_post_meta(item.id).await?;
        drafts.push(item_draft(ctx, menu_id, item, &meta).await?);
    }
    drafts.sort_by_key(|draft| (draft.record.order, draft.legacy_id));

    let mut inserted: HashMap<LegacyId, TargetId> = HashMap::new();
    for draft in &drafts {
        match ctx.target.insert_menu_item(&draft.record).await {
            Ok(id) => {
                inserted.insert(draft.legacy_id, id);
                ctx.resolver.record(EntityFamily::MenuItems, draft.legacy_id, id);
                summary.created();
            }
            Err(e) => {
                warn!(legacy_id = draft.legacy_id, family = "menu_items", reason = %e, "Failed to migrate menu item");
                summary.fail();
            }
        }
    }

    // Parents come from this menu's own items only.
    let mut links = ParentLinks::new();
    for draft in drafts.iter().filter(|draft| draft.legacy_parent != 0) {
        let (Some(id), Some(parent_id)) = (
            inserted.get(&draft.legacy_id).copied(),
            inserted.get(&draft.legacy_parent).copied(),
        ) else {
            debug!(legacy_id = draft.legacy_id, parent = draft.legacy_parent, "Menu item parent unresolved, leaving root");
            continue;
        };
        if !links.link(id, parent_id) {
            warn!(legacy_id = draft.legacy_id, family = "menu_items", reason = "cycle", "Skipping menu item parent link");
            continue;
        }
        if let Err(e) = ctx.target.set_menu_item_parent(id, Some(parent_id)).await {
            warn!(legacy_id = draft.legacy_id, family = "menu_items", reason = %e, "Failed to link menu item parent");
        }
    }

    info!(menu = %term.name, items = inserted.len(), "Migrated menu");
    Ok(())
}

async fn item_draft(
    ctx: &MigrationContext<'_>,
    menu_id: TargetId,
    item: &LegacyPost,
    meta: &[LegacyMeta],
) -> Result<ItemDraft, MigrationError> {
    let item_type = meta_text(meta, "_menu_item_type").unwrap_or_default();
    let object = meta_text(meta, "_menu_item_object").unwrap_or_default();
    let object_id = meta_text(meta, "_menu_item_object_id").and_then(|v| v.parse::<LegacyId>().ok());

    let url = meta_text(meta, "_menu_item_url");
    let mut route = None;
    let mut page_id = None;
    let mut article_id = None;
    let mut fallback_title = None;

    match (item_type.as_str(), object_id) {
        ("post_type", Some(object_id)) => {
            if let Some(target) = ctx.legacy.find_post(object_id).await? {
                let family = ctx.config.family_of(&object).or_else(|| ctx.config.family_of(&target.post_type));
                if let Some(family) = family {
                    route = content_slug(ctx.resolver, family, &target)
                        .map(|slug| content_route(family, &slug));
                    let migrated = ctx.resolver.lookup(family.into(), object_id);
                    match family {
                        ContentFamily::Page => page_id = migrated,
                        ContentFamily::Article => article_id = migrated,
                        _ => {}
                    }
                }
                fallback_title = non_empty(&target.title);
            }
        }
        ("taxonomy", Some(object_id)) => {
            if let Some(term) = ctx.legacy.find_term(object_id).await? {
                route = Some(format!("/category/{}", term.slug));
                fallback_title = non_empty(&term.name);
            }
        }
        ("custom", _) => {}
        _ => {
            if url.is_none() {
                debug!(legacy_id = item.id, item_type = %item_type, "Menu item without a resolvable link");
            }
        }
    }

    let title = non_empty(&item.title)
        .or_else(|| meta_text(meta, "_menu_item_attr_title"))
        .or(fallback_title)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let order = meta_text(meta, "_menu_item_menu_order")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(item.menu_order);

    Ok(ItemDraft {
        legacy_id: item.id,
        legacy_parent: meta_text(meta, "_menu_item_menu_item_parent")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        record: MenuItemRecord {
            menu_id,
            title,
            url,
            route,
            target: meta_text(meta, "_menu_item_target").unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            css_class: meta_text(meta, "_menu_item_classes").and_then(|raw| css_classes(&raw)),
            order: clamp_i32(order),
            page_id,
            article_id,
        },
    })
}

/// Public route of a content item in the new site.
pub fn content_route(family: ContentFamily, slug: &str) -> String {
    match family {
        ContentFamily::Page => format!("/{slug}"),
        ContentFamily::Article => format!("/articles/{slug}"),
        ContentFamily::Portfolio => format!("/portfolio/{slug}"),
        ContentFamily::Product => format!("/products/{slug}"),
    }
}

/// Flattens the serialized `_menu_item_classes` array into a class attribute.
fn css_classes(raw: &str) -> Option<String> {
    let classes = match php_serialized::decode(raw) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Some(Value::String(class)) => class.trim().to_string(),
        Some(_) => String::new(),
        None => raw.trim().to_string(),
    };
    (!classes.is_empty()).then_some(classes)
}

fn meta_text(meta: &[LegacyMeta], key: &str) -> Option<String> {
    find_value(meta, key).and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_per_family() {
        assert_eq!(content_route(ContentFamily::Page, "about"), "/about");
        assert_eq!(content_route(ContentFamily::Article, "news"), "/articles/news");
        assert_eq!(content_route(ContentFamily::Portfolio, "p"), "/portfolio/p");
        assert_eq!(content_route(ContentFamily::Product, "x"), "/products/x");
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(
            css_classes(r#"a:2:{i:0;s:4:"menu";i:1;s:0:"";}"#),
            Some("menu".to_string())
        );
        assert_eq!(css_classes(r#"a:1:{i:0;s:0:"";}"#), None);
        assert_eq!(css_classes("plain"), Some("plain".to_string()));
    }
}

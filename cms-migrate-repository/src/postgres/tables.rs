//! Table names of the CMS schema.
use cms_migrate_shared::types::ContentFamily;

/// Every CMS table, children before parents. Deleting in this order never
/// violates a foreign key.
pub const CLEAR_ORDER: [&str; 24] = [
    "cms_term_relationships",
    "cms_comment_meta",
    "cms_comments",
    "cms_term_taxonomies",
    "cms_terms",
    "cms_menu_items",
    "cms_menus",
    "cms_page_meta",
    "cms_article_meta",
    "cms_portfolio_meta",
    "cms_product_meta",
    "cms_media_sizes",
    "cms_media",
    "cms_page_translations",
    "cms_article_translations",
    "cms_portfolio_translations",
    "cms_product_translations",
    "cms_pages",
    "cms_articles",
    "cms_portfolios",
    "cms_products",
    "cms_user_meta",
    "cms_users",
    "cms_settings",
];

/// The tables backing one content family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTables {
    pub content: &'static str,
    pub translations: &'static str,
    pub meta: &'static str,
    /// Column referencing this family on polymorphic join tables.
    pub foreign_key: &'static str,
}

impl ContentTables {
    pub fn of(family: ContentFamily) -> Self {
        match family {
            ContentFamily::Page => Self {
                content: "cms_pages",
                translations: "cms_page_translations",
                meta: "cms_page_meta",
                foreign_key: "page_id",
            },
            ContentFamily::Article => Self {
                content: "cms_articles",
                translations: "cms_article_translations",
                meta: "cms_article_meta",
                foreign_key: "article_id",
            },
            ContentFamily::Portfolio => Self {
                content: "cms_portfolios",
                translations: "cms_portfolio_translations",
                meta: "cms_portfolio_meta",
                foreign_key: "portfolio_id",
            },
            ContentFamily::Product => Self {
                content: "cms_products",
                translations: "cms_product_translations",
                meta: "cms_product_meta",
                foreign_key: "product_id",
            },
        }
    }
}

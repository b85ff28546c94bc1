use crate::types::TargetId;

/// A navigation menu, unique by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRecord {
    pub name: String,
    pub location: String,
}

/// A menu entry. Created without a parent; the hierarchy is wired afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemRecord {
    pub menu_id: TargetId,
    pub title: String,
    /// Direct URL for custom links.
    pub url: Option<String>,
    /// Route computed from the referenced content or term.
    pub route: Option<String>,
    pub target: String,
    pub css_class: Option<String>,
    pub order: i32,
    pub page_id: Option<TargetId>,
    pub article_id: Option<TargetId>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContentRef, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentStatus {
    Approved,
    Pending,
}

impl CommentStatus {
    /// WordPress stores `"1"` for approved comments; `"0"`, `"spam"` and
    /// `"trash"` all land in the moderation queue.
    pub fn from_legacy(approved: &str) -> Self {
        if approved.trim() == "1" {
            CommentStatus::Approved
        } else {
            CommentStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Approved => "approved",
            CommentStatus::Pending => "pending",
        }
    }
}

/// A comment row. `content` is `None` for orphaned comments whose target
/// could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub content: Option<ContentRef>,
    pub user_id: Option<TargetId>,
    pub author_name: String,
    pub author_email: String,
    pub author_url: String,
    pub body: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

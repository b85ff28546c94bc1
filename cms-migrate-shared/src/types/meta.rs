use serde_json::Value;

use crate::types::TargetId;

/// A structured meta row attached to a user, content item or comment.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEntry {
    pub key: String,
    pub value: Value,
    pub media_id: Option<TargetId>,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            media_id: None,
        }
    }

    pub fn with_media(mut self, media_id: Option<TargetId>) -> Self {
        self.media_id = media_id;
        self
    }
}

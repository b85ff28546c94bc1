use serde_json::Value;

/// A global setting, unique by key.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingRecord {
    pub key: String,
    pub value: Value,
}

//! Lightweight item shape returned by `op item list`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::*;

/// Reference to the vault an item lives in. Shares identity with the
/// vault, not ownership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultRef {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VaultRef {
    pub fn unique_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUrl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(default)]
    pub href: String,
}

impl ItemUrl {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            label: None,
            primary: None,
            href: href.into(),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }
}

/// Read-only list-context view of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) category: ItemCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) vault: Option<VaultRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) last_edited_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) urls: Option<Vec<ItemUrl>>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl ItemDescriptor {
    /// Take ownership of a raw descriptor record.
    pub fn from_value(value: Value) -> OpResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| OpError::invalid_item(format!("Malformed item descriptor: {}", e)))
    }

    pub fn unique_id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &ItemCategory {
        &self.category
    }

    pub fn version(&self) -> Option<i64> {
        self.version
    }

    pub fn vault(&self) -> Option<&VaultRef> {
        self.vault.as_ref()
    }

    pub fn vault_id(&self) -> Option<&str> {
        self.vault.as_ref().map(|v| v.id.as_str())
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn favorite(&self) -> bool {
        self.favorite.unwrap_or(false)
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn archived(&self) -> bool {
        self.state.as_deref() == Some("ARCHIVED")
    }

    pub fn last_edited_by(&self) -> Option<&str> {
        self.last_edited_by.as_deref()
    }

    /// `created_at`, or `None` when the record lacks it.
    pub fn created_at(&self) -> OpResult<Option<DateTime<FixedOffset>>> {
        self.created_at.as_deref().map(parse_timestamp).transpose()
    }

    pub fn updated_at(&self) -> OpResult<Option<DateTime<FixedOffset>>> {
        self.updated_at.as_deref().map(parse_timestamp).transpose()
    }

    pub fn urls(&self) -> &[ItemUrl] {
        self.urls.as_deref().unwrap_or_default()
    }

    /// The URL flagged primary, falling back to the first one.
    pub fn primary_url(&self) -> Option<&ItemUrl> {
        let urls = self.urls();
        urls.iter().find(|u| u.is_primary()).or_else(|| urls.first())
    }

    /// Keys the model does not interpret.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn to_value(&self) -> OpResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize descriptor: {}", e)))
    }
}

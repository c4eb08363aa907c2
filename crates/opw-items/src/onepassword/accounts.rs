//! Vault, user and group records from `op vault|user|group get/list`.

use std::ops::Deref;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::*;

/// Common surface of account-level records.
pub trait AccountRecord: Serialize + DeserializeOwned {
    /// What the record is, used in error messages.
    const KIND: &'static str;

    fn unique_id(&self) -> &str;
    fn name(&self) -> &str;
    fn raw_created_at(&self) -> Option<&str>;
    fn raw_updated_at(&self) -> Option<&str>;

    fn created_at(&self) -> OpResult<Option<DateTime<FixedOffset>>> {
        self.raw_created_at().map(parse_timestamp).transpose()
    }

    fn updated_at(&self) -> OpResult<Option<DateTime<FixedOffset>>> {
        self.raw_updated_at().map(parse_timestamp).transpose()
    }

    fn from_value(value: Value) -> OpResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| OpError::invalid_item(format!("Malformed {} record: {}", Self::KIND, e)))
    }

    fn from_json(text: &str) -> OpResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| OpError::invalid_item(format!("Malformed {} record: {}", Self::KIND, e)))
    }
}

macro_rules! account_record {
    ($name:ident, $kind:expr) => {
        impl AccountRecord for $name {
            const KIND: &'static str = $kind;

            fn unique_id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn raw_created_at(&self) -> Option<&str> {
                self.created_at.as_deref()
            }

            fn raw_updated_at(&self) -> Option<&str> {
                self.updated_at.as_deref()
            }
        }
    };
}

// ─── Records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<i64>,
    /// Item count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub vault_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

account_record!(Vault, "vault");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_auth_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

account_record!(User, "user");

impl User {
    pub fn last_auth_at(&self) -> OpResult<Option<DateTime<FixedOffset>>> {
        self.last_auth_at.as_deref().map(parse_timestamp).transpose()
    }

    pub fn is_active(&self) -> bool {
        self.state.as_deref() == Some("ACTIVE")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

account_record!(Group, "group");

impl Group {
    pub fn permissions(&self) -> &[String] {
        self.permissions.as_deref().unwrap_or_default()
    }
}

// ─── Lists ───────────────────────────────────────────────────────────

/// Records sorted by (name, id) regardless of `op`'s output order.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountList<T: AccountRecord> {
    records: Vec<T>,
}

pub type VaultList = AccountList<Vault>;
pub type UserList = AccountList<User>;
pub type GroupList = AccountList<Group>;

impl<T: AccountRecord> AccountList<T> {
    pub fn new(mut records: Vec<T>) -> Self {
        records.sort_by(|a, b| (a.name(), a.unique_id()).cmp(&(b.name(), b.unique_id())));
        Self { records }
    }

    pub fn from_json(text: &str) -> OpResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            OpError::invalid_item(format!("Failed to parse {} list JSON: {}", T::KIND, e))
        })?;
        match value {
            Value::Null => Ok(Self::new(Vec::new())),
            Value::Array(values) => {
                let records = values
                    .into_iter()
                    .map(T::from_value)
                    .collect::<OpResult<Vec<T>>>()?;
                Ok(Self::new(records))
            }
            other => Err(OpError::invalid_item(format!("{} list is not a JSON array", T::KIND))
                .with_record(other)),
        }
    }

    pub fn serialize(&self) -> OpResult<String> {
        serde_json::to_string(&self.records).map_err(|e| {
            OpError::invalid_item(format!("Failed to serialize {} list: {}", T::KIND, e))
        })
    }

    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.records.iter().find(|r| r.name() == name)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.records
    }
}

impl<T: AccountRecord> Deref for AccountList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vault_record_parses() {
        let vault = Vault::from_value(json!({
            "id": "yhdg6ovhkjcfhn3u25cp2bnl6e",
            "name": "Test Data",
            "content_version": 91,
            "attribute_version": 1,
            "items": 12,
            "type": "USER_CREATED",
            "created_at": "2021-04-10T17:34:26Z",
            "updated_at": "2023-01-03T19:27:28-08:00"
        }))
        .unwrap();
        assert_eq!(vault.unique_id(), "yhdg6ovhkjcfhn3u25cp2bnl6e");
        assert_eq!(vault.items, Some(12));
        assert_eq!(vault.vault_type.as_deref(), Some("USER_CREATED"));
        assert!(vault.created_at().unwrap().unwrap() < vault.updated_at().unwrap().unwrap());
    }

    #[test]
    fn user_and_group_records() {
        let user = User::from_json(
            r#"{"id":"UVZS3QK2VFCDLCJCXMP5UB3QRY","name":"Ada","email":"ada@example.com","type":"MEMBER","state":"ACTIVE","last_auth_at":"2023-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(user.is_active());
        assert!(user.last_auth_at().unwrap().is_some());
        assert!(user.created_at().unwrap().is_none());

        let group = Group::from_value(json!({
            "id": "yhd7x2rm3nftfkapjyrzdjdvxe",
            "name": "Owners",
            "permissions": ["MANAGE_GROUPS"],
            "custom": 1
        }))
        .unwrap();
        assert_eq!(group.permissions(), ["MANAGE_GROUPS".to_string()]);
        assert_eq!(group.extra["custom"], 1);
    }

    #[test]
    fn lists_are_sorted_by_name_then_id() {
        let list = VaultList::from_json(
            &json!([
                { "id": "b", "name": "Work" },
                { "id": "c", "name": "Private" },
                { "id": "a", "name": "Work" }
            ])
            .to_string(),
        )
        .unwrap();
        let ids: Vec<&str> = list.iter().map(|v| v.unique_id()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(list.find_by_name("Work").unwrap().id, "a");

        let again = VaultList::from_json(&list.serialize().unwrap()).unwrap();
        assert_eq!(again, list);
    }

    #[test]
    fn malformed_records_are_invalid() {
        let err = UserList::from_json(r#"[{"name":"no id"}]"#).unwrap_err();
        assert_eq!(err.kind, OpErrorKind::InvalidItem);
        let err = GroupList::from_json(r#"{"id":"x"}"#).unwrap_err();
        assert_eq!(err.kind, OpErrorKind::InvalidItem);
    }

    #[test]
    fn bad_timestamp_surfaces_on_access() {
        let vault = Vault::from_value(json!({ "id": "v", "name": "n", "created_at": "yesterday" })).unwrap();
        assert_eq!(vault.created_at().unwrap_err().kind, OpErrorKind::TimestampFormat);
    }
}

//! Category discriminator → item constructor table.
//!
//! The registry is an ordinary value built by [`ItemRegistry::new`]; there
//! is no process-wide table. Validation mode is not part of the registry:
//! every constructor produces both strict and relaxed items, depending on
//! the [`ParseOptions`] handed to the parse call.

use std::collections::HashMap;

use serde_json::Value;

use super::categories::*;
use super::descriptor::ItemDescriptor;
use super::item::FullItem;
use super::types::*;

/// Wraps a parsed [`FullItem`] in its category type.
pub type ItemConstructor = fn(FullItem) -> Item;

#[derive(Debug, Clone)]
pub struct ItemRegistry {
    constructors: HashMap<String, ItemConstructor>,
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRegistry {
    /// Registry populated with every built-in category type.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(LoginItem::CATEGORY, |i| Item::Login(LoginItem::new(i)));
        registry.register(PasswordItem::CATEGORY, |i| Item::Password(PasswordItem::new(i)));
        registry.register(ServerItem::CATEGORY, |i| Item::Server(ServerItem::new(i)));
        registry.register(DatabaseItem::CATEGORY, |i| Item::Database(DatabaseItem::new(i)));
        registry.register(DocumentItem::CATEGORY, |i| Item::Document(DocumentItem::new(i)));
        registry.register(SshKeyItem::CATEGORY, |i| Item::SshKey(SshKeyItem::new(i)));
        registry.register(CreditCardItem::CATEGORY, |i| {
            Item::CreditCard(CreditCardItem::new(i))
        });
        registry.register(SecureNoteItem::CATEGORY, |i| {
            Item::SecureNote(SecureNoteItem::new(i))
        });
        registry.register(IdentityItem::CATEGORY, |i| Item::Identity(IdentityItem::new(i)));
        registry.register(ApiCredentialItem::CATEGORY, |i| {
            Item::ApiCredential(ApiCredentialItem::new(i))
        });
        registry
    }

    /// Registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for a discriminator.
    pub fn register(&mut self, category: impl Into<ItemCategory>, constructor: ItemConstructor) {
        let category: ItemCategory = category.into();
        self.constructors
            .insert(category.as_str().to_string(), constructor);
    }

    pub fn is_registered(&self, category: &ItemCategory) -> bool {
        self.constructors.contains_key(category.as_str())
    }

    /// Registered discriminators, sorted.
    pub fn discriminators(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.constructors.keys().cloned().collect();
        keys.sort();
        keys
    }

    // ─── Full items ──────────────────────────────────────────────────

    pub fn item_from_json(&self, text: &str, opts: ParseOptions) -> OpResult<Item> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| OpError::invalid_item(format!("Failed to parse item JSON: {}", e)))?;
        self.item_from_value(value, opts)
    }

    /// Classify and construct an item, taking ownership of the record.
    pub fn item_from_value(&self, value: Value, opts: ParseOptions) -> OpResult<Item> {
        let category = discriminator(&value)?;
        let constructor = self.constructors.get(&category).copied();
        if constructor.is_none() && !opts.generic_okay {
            return Err(OpError::unknown_item_type(&category).with_record(value));
        }
        let item = FullItem::from_value(value, opts.mode)?;
        match constructor {
            Some(construct) => Ok(construct(item)),
            None => {
                log::debug!("no item type for category '{}', using generic", category);
                Ok(Item::Generic(item))
            }
        }
    }

    // ─── Descriptors ─────────────────────────────────────────────────

    /// Parse a list-context record. Unregistered categories are rejected
    /// unless `generic_okay`.
    pub fn descriptor_from_value(&self, value: Value, generic_okay: bool) -> OpResult<ItemDescriptor> {
        let category = discriminator(&value)?;
        if !generic_okay && !self.constructors.contains_key(&category) {
            return Err(OpError::unknown_item_type(&category).with_record(value));
        }
        ItemDescriptor::from_value(value)
    }

    pub fn descriptor_from_json(&self, text: &str, generic_okay: bool) -> OpResult<ItemDescriptor> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| OpError::invalid_item(format!("Failed to parse item JSON: {}", e)))?;
        self.descriptor_from_value(value, generic_okay)
    }
}

/// The `category` discriminator of a raw record; `""` when absent.
fn discriminator(value: &Value) -> OpResult<String> {
    if !value.is_object() {
        return Err(OpError::invalid_item("Item record is not a JSON object").with_record(value.clone()));
    }
    Ok(value
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(category: &str) -> Value {
        json!({
            "id": "abcdefghijklmnopqrstuvwxyz",
            "title": "minimal",
            "category": category,
            "sections": [{ "id": "s", "label": "S" }],
            "fields": [{ "id": "f", "type": "STRING", "label": "f", "value": "v", "section": { "id": "s" } }]
        })
    }

    #[test]
    fn every_discriminator_parses_in_both_modes() {
        let registry = ItemRegistry::new();
        assert_eq!(registry.discriminators().len(), 10);
        for category in registry.discriminators() {
            for opts in [ParseOptions::strict(), ParseOptions::relaxed()] {
                let item = registry.item_from_value(minimal(&category), opts).unwrap();
                assert!(!item.is_generic(), "{} produced a generic item", category);
                assert_eq!(item.category().as_str(), category);
                assert_eq!(item.mode(), opts.mode);
            }
        }
    }

    #[test]
    fn category_maps_to_variant() {
        let registry = ItemRegistry::new();
        let item = registry.item_from_value(minimal("LOGIN"), ParseOptions::strict()).unwrap();
        assert!(matches!(item, Item::Login(_)));
        let item = registry
            .item_from_value(minimal("API_CREDENTIAL"), ParseOptions::strict())
            .unwrap();
        assert!(matches!(item, Item::ApiCredential(_)));
    }

    #[test]
    fn unknown_category_carries_record() {
        let registry = ItemRegistry::new();
        let err = registry
            .item_from_value(minimal("CRYPTO_WALLET"), ParseOptions::strict())
            .unwrap_err();
        assert_eq!(err.kind, OpErrorKind::UnknownItemType);
        assert_eq!(err.record.unwrap()["category"], "CRYPTO_WALLET");
    }

    #[test]
    fn missing_category_is_unknown() {
        let registry = ItemRegistry::new();
        let err = registry
            .item_from_value(json!({ "id": "x", "title": "t" }), ParseOptions::strict())
            .unwrap_err();
        assert_eq!(err.kind, OpErrorKind::UnknownItemType);
    }

    #[test]
    fn generic_okay_falls_back() {
        let registry = ItemRegistry::new();
        let opts = ParseOptions::strict().with_generic(true);
        let item = registry.item_from_value(minimal("MEDICAL_RECORD"), opts).unwrap();
        assert!(item.is_generic());
        assert_eq!(item.field_value_by_id("f").unwrap(), Some("v"));
    }

    #[test]
    fn malformed_json_is_invalid_item() {
        let registry = ItemRegistry::new();
        let err = registry
            .item_from_json("{\"id\": ", ParseOptions::strict())
            .unwrap_err();
        assert_eq!(err.kind, OpErrorKind::InvalidItem);
        let err = registry.item_from_json("[1, 2]", ParseOptions::strict()).unwrap_err();
        assert_eq!(err.kind, OpErrorKind::InvalidItem);
    }

    #[test]
    fn custom_registration_extends_the_table() {
        let mut registry = ItemRegistry::empty();
        assert!(!registry.is_registered(&ItemCategory::Membership));
        registry.register(ItemCategory::Membership, Item::Generic);
        assert!(registry.is_registered(&ItemCategory::Membership));
        let item = registry
            .item_from_value(minimal("MEMBERSHIP"), ParseOptions::strict())
            .unwrap();
        assert!(item.is_generic());
    }

    #[test]
    fn descriptor_respects_generic_flag() {
        let registry = ItemRegistry::new();
        assert!(registry.descriptor_from_value(minimal("LOGIN"), false).is_ok());
        let err = registry
            .descriptor_from_value(minimal("CRYPTO_WALLET"), false)
            .unwrap_err();
        assert_eq!(err.kind, OpErrorKind::UnknownItemType);
        let d = registry
            .descriptor_from_json(&minimal("CRYPTO_WALLET").to_string(), true)
            .unwrap();
        assert_eq!(d.category(), &ItemCategory::Other("CRYPTO_WALLET".into()));
    }
}

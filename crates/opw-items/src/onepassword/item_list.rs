use std::ops::Deref;

use serde_json::Value;

use super::descriptor::ItemDescriptor;
use super::registry::ItemRegistry;
use super::types::*;

/// Descriptors from `op item list`, always sorted by (title, id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemList {
    items: Vec<ItemDescriptor>,
}

impl ItemList {
    pub fn from_json(text: &str, registry: &ItemRegistry, generic_okay: bool) -> OpResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| OpError::invalid_item(format!("Failed to parse item list JSON: {}", e)))?;
        match value {
            Value::Array(values) => Self::from_values(values, registry, generic_okay),
            // `op` prints nothing for an empty vault
            Value::Null => Ok(Self::default()),
            other => Err(OpError::invalid_item("Item list is not a JSON array").with_record(other)),
        }
    }

    pub fn from_values(
        values: Vec<Value>,
        registry: &ItemRegistry,
        generic_okay: bool,
    ) -> OpResult<Self> {
        let items = values
            .into_iter()
            .map(|v| registry.descriptor_from_value(v, generic_okay))
            .collect::<OpResult<Vec<_>>>()?;
        Ok(Self::from_descriptors(items))
    }

    pub fn from_descriptors(mut items: Vec<ItemDescriptor>) -> Self {
        items.sort_by(|a, b| (a.title(), a.unique_id()).cmp(&(b.title(), b.unique_id())));
        Self { items }
    }

    /// JSON array text that parses back to an equal list.
    pub fn serialize(&self) -> OpResult<String> {
        serde_json::to_string(&self.items)
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize item list: {}", e)))
    }

    pub fn by_category(&self, category: &ItemCategory) -> Vec<&ItemDescriptor> {
        self.items
            .iter()
            .filter(|d| d.category() == category)
            .collect()
    }

    pub fn unique_ids(&self) -> Vec<&str> {
        self.items.iter().map(|d| d.unique_id()).collect()
    }

    pub fn into_inner(self) -> Vec<ItemDescriptor> {
        self.items
    }
}

impl Deref for ItemList {
    type Target = [ItemDescriptor];

    fn deref(&self) -> &[ItemDescriptor] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a ItemList {
    type Item = &'a ItemDescriptor;
    type IntoIter = std::slice::Iter<'a, ItemDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list_json() -> String {
        json!([
            { "id": "zzzzzzzzzzzzzzzzzzzzzzzzzz", "title": "Beta", "category": "LOGIN" },
            { "id": "bbbbbbbbbbbbbbbbbbbbbbbbbb", "title": "Alpha", "category": "PASSWORD" },
            { "id": "aaaaaaaaaaaaaaaaaaaaaaaaaa", "title": "Beta", "category": "SERVER" },
            { "id": "cccccccccccccccccccccccccc", "title": "alpha", "category": "LOGIN" }
        ])
        .to_string()
    }

    #[test]
    fn sorted_by_title_then_id() {
        let list = ItemList::from_json(&list_json(), &ItemRegistry::new(), false).unwrap();
        let order: Vec<(&str, &str)> = list.iter().map(|d| (d.title(), d.unique_id())).collect();
        assert_eq!(
            order,
            vec![
                ("Alpha", "bbbbbbbbbbbbbbbbbbbbbbbbbb"),
                ("Beta", "aaaaaaaaaaaaaaaaaaaaaaaaaa"),
                ("Beta", "zzzzzzzzzzzzzzzzzzzzzzzzzz"),
                ("alpha", "cccccccccccccccccccccccccc"),
            ]
        );
    }

    #[test]
    fn serialize_round_trips() {
        let registry = ItemRegistry::new();
        let list = ItemList::from_json(&list_json(), &registry, false).unwrap();
        let again = ItemList::from_json(&list.serialize().unwrap(), &registry, false).unwrap();
        assert_eq!(again.len(), list.len());
        assert_eq!(again, list);
    }

    #[test]
    fn unknown_category_requires_generic_okay() {
        let registry = ItemRegistry::new();
        let text = json!([{ "id": "x", "title": "x", "category": "CRYPTO_WALLET" }]).to_string();
        let err = ItemList::from_json(&text, &registry, false).unwrap_err();
        assert_eq!(err.kind, OpErrorKind::UnknownItemType);
        assert_eq!(ItemList::from_json(&text, &registry, true).unwrap().len(), 1);
    }

    #[test]
    fn empty_output_and_non_array() {
        let registry = ItemRegistry::new();
        assert!(ItemList::from_json("null", &registry, false).unwrap().is_empty());
        assert!(ItemList::from_json("[]", &registry, false).unwrap().is_empty());
        let err = ItemList::from_json("{}", &registry, false).unwrap_err();
        assert_eq!(err.kind, OpErrorKind::InvalidItem);
    }

    #[test]
    fn by_category_filters() {
        let list = ItemList::from_json(&list_json(), &ItemRegistry::new(), false).unwrap();
        assert_eq!(list.by_category(&ItemCategory::Login).len(), 2);
        assert_eq!(list.unique_ids().len(), 4);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::field::ItemField;
use super::ids::{generate_section_id, is_generated_id};
use super::types::*;

// ─── Existing section ────────────────────────────────────────────────

/// A labelled grouping of fields read from `op` output. Fields are
/// registered while the owning item is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
    #[serde(skip)]
    fields: Vec<ItemField>,
}

impl Section {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            label: Some(label.into()),
            extra: Map::new(),
            fields: Vec::new(),
        }
    }

    /// Take ownership of a raw section record.
    pub fn from_value(value: Value) -> OpResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| OpError::invalid_item(format!("Malformed section record: {}", e)))
    }

    /// Section ID, or `""` for an ID-less section.
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Member fields in registration order.
    pub fn fields(&self) -> &[ItemField] {
        &self.fields
    }

    /// Link a field into this section. In strict mode an ID that is
    /// already registered is a collision; relaxed mode appends it anyway.
    pub fn register_field(&mut self, field: ItemField, mode: ValidationMode) -> OpResult<()> {
        if self.fields.iter().any(|f| f.id() == field.id()) {
            if !mode.is_relaxed() {
                return Err(OpError::field_collision(field.id()));
            }
            log::debug!(
                "relaxed: duplicate field '{}' in section '{}'",
                field.id(),
                self.id()
            );
        }
        self.fields.push(field);
        Ok(())
    }

    /// All member fields with the given label. Labels are not unique.
    pub fn fields_by_label(&self, label: &str) -> Vec<&ItemField> {
        self.fields
            .iter()
            .filter(|f| f.label() == Some(label))
            .collect()
    }

    pub fn first_field_by_label(&self, label: &str) -> OpResult<&ItemField> {
        self.fields_by_label(label)
            .into_iter()
            .next()
            .ok_or_else(|| {
                OpError::field_not_found(format!("labeled '{}' in section '{}'", label, self.id()))
            })
    }
}

// ─── New section ─────────────────────────────────────────────────────

/// A section to be submitted with a new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSection {
    id: String,
    label: String,
}

impl NewSection {
    /// New section; an ID is generated unless one is supplied.
    pub fn new(label: impl Into<String>, id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string).unwrap_or_else(generate_section_id),
            label: label.into(),
        }
    }

    /// Derive from an existing section. Randomly assigned IDs are
    /// regenerated so the copy cannot collide with its original; stable
    /// IDs such as template section names are preserved.
    pub fn from_section(section: &Section) -> Self {
        let id = if section.has_id() && !is_generated_id(section.id()) {
            section.id().to_string()
        } else {
            generate_section_id()
        };
        Self {
            id,
            label: section.label().unwrap_or_default().to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(id: &str, label: &str) -> ItemField {
        ItemField::from_value(json!({ "id": id, "type": "STRING", "label": label, "value": id })).unwrap()
    }

    #[test]
    fn fields_by_label_returns_every_match() {
        let mut section = Section::new("s1", "Details");
        section.register_field(field("a", "pin"), ValidationMode::Strict).unwrap();
        section.register_field(field("b", "pin"), ValidationMode::Strict).unwrap();
        section.register_field(field("c", "other"), ValidationMode::Strict).unwrap();
        assert_eq!(section.fields_by_label("pin").len(), 2);
        assert_eq!(section.first_field_by_label("pin").unwrap().id(), "a");
        assert!(section.fields_by_label("missing").is_empty());
    }

    #[test]
    fn first_field_by_label_missing_is_not_found() {
        let section = Section::new("s1", "Details");
        let err = section.first_field_by_label("pin").unwrap_err();
        assert_eq!(err.kind, OpErrorKind::FieldNotFound);
    }

    #[test]
    fn strict_register_rejects_duplicate_id() {
        let mut section = Section::new("s1", "Details");
        section.register_field(field("a", "one"), ValidationMode::Strict).unwrap();
        let err = section
            .register_field(field("a", "two"), ValidationMode::Strict)
            .unwrap_err();
        assert_eq!(err.kind, OpErrorKind::FieldCollision);
    }

    #[test]
    fn relaxed_register_keeps_duplicates() {
        let mut section = Section::new("s1", "Details");
        section.register_field(field("a", "one"), ValidationMode::Relaxed).unwrap();
        section.register_field(field("a", "two"), ValidationMode::Relaxed).unwrap();
        assert_eq!(section.fields().len(), 2);
    }

    #[test]
    fn from_section_preserves_stable_id() {
        let original = Section::new("add more", "");
        let copy = NewSection::from_section(&original);
        assert_eq!(copy.id(), "add more");
    }

    #[test]
    fn from_section_regenerates_generated_id() {
        let original = Section::new("Section_0123456789abcdef0123456789abcdef", "Extra");
        let copy = NewSection::from_section(&original);
        assert_ne!(copy.id(), original.id());
        assert!(copy.id().starts_with("Section_"));
        assert_eq!(copy.label(), "Extra");

        let base32 = Section::new("linked items xx", "Linked");
        assert_eq!(NewSection::from_section(&base32).id(), "linked items xx");
        let random = Section::new("tiyhk2dexx7ctl5kvnjeugvwiq", "Random");
        assert_ne!(NewSection::from_section(&random).id(), random.id());
    }

    #[test]
    fn section_record_round_trips_unknown_keys() {
        let section = Section::from_value(json!({ "id": "s", "label": "L", "collapsed": true })).unwrap();
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value, json!({ "id": "s", "label": "L", "collapsed": true }));
    }
}

use std::collections::HashMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::descriptor::ItemDescriptor;
use super::field::ItemField;
use super::section::Section;
use super::types::*;

/// Raw shape of `op item get --format json` output.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemRecord {
    #[serde(flatten)]
    descriptor: ItemDescriptor,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    fields: Vec<ItemField>,
}

#[derive(Serialize)]
struct ItemRecordRef<'a> {
    #[serde(flatten)]
    descriptor: &'a ItemDescriptor,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    sections: &'a [Section],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    fields: &'a [ItemField],
}

/// A complete item: descriptor plus its sections and fields.
///
/// Sections and fields keep their source order. The ID maps point at the
/// last entry registered for a given ID, so under relaxed validation a
/// duplicated field ID is visible positionally but only once by key.
#[derive(Debug, Clone)]
pub struct FullItem {
    descriptor: ItemDescriptor,
    sections: Vec<Section>,
    section_index: HashMap<String, usize>,
    fields: Vec<ItemField>,
    field_index: HashMap<String, usize>,
    mode: ValidationMode,
}

impl FullItem {
    /// Parse a raw record, taking ownership of it.
    pub fn from_value(value: Value, mode: ValidationMode) -> OpResult<Self> {
        let record: ItemRecord = serde_json::from_value(value)
            .map_err(|e| OpError::invalid_item(format!("Malformed item record: {}", e)))?;
        Self::from_record(record, mode)
    }

    pub(crate) fn from_record(record: ItemRecord, mode: ValidationMode) -> OpResult<Self> {
        let mut item = Self {
            descriptor: record.descriptor,
            sections: Vec::with_capacity(record.sections.len()),
            section_index: HashMap::new(),
            fields: Vec::with_capacity(record.fields.len()),
            field_index: HashMap::new(),
            mode,
        };
        for section in record.sections {
            item.add_section(section)?;
        }
        for field in record.fields {
            item.add_field(field)?;
        }
        Ok(item)
    }

    fn add_section(&mut self, section: Section) -> OpResult<()> {
        if !section.has_id() {
            if !self.mode.is_relaxed() {
                return Err(OpError::invalid_item(format!(
                    "Item '{}' has a section without an ID",
                    self.descriptor.unique_id()
                )));
            }
            log::debug!(
                "relaxed: item '{}' has an ID-less section",
                self.descriptor.unique_id()
            );
        }
        let id = section.id().to_string();
        if self.section_index.contains_key(&id) {
            if !self.mode.is_relaxed() {
                return Err(OpError::section_collision(&id));
            }
            log::debug!(
                "relaxed: duplicate section '{}' in item '{}'",
                id,
                self.descriptor.unique_id()
            );
        }
        self.section_index.insert(id, self.sections.len());
        self.sections.push(section);
        Ok(())
    }

    fn add_field(&mut self, field: ItemField) -> OpResult<()> {
        if !field.has_id() {
            if !self.mode.is_relaxed() {
                return Err(OpError::invalid_item(format!(
                    "Item '{}' has a field without an ID",
                    self.descriptor.unique_id()
                )));
            }
            log::debug!(
                "relaxed: item '{}' has an ID-less field",
                self.descriptor.unique_id()
            );
        }
        let id = field.id().to_string();
        if self.field_index.contains_key(&id) {
            if !self.mode.is_relaxed() {
                return Err(OpError::field_collision(&id));
            }
            log::debug!(
                "relaxed: duplicate field '{}' in item '{}'",
                id,
                self.descriptor.unique_id()
            );
        }
        if let Some(section_id) = field.section_id() {
            match self.section_index.get(section_id) {
                Some(&idx) => self.sections[idx].register_field(field.clone(), self.mode)?,
                None if self.mode.is_relaxed() => {
                    log::debug!(
                        "relaxed: field '{}' names unknown section '{}'",
                        id,
                        section_id
                    );
                }
                None => return Err(OpError::section_not_found(format!("'{}'", section_id))),
            }
        }
        self.field_index.insert(id, self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub fn descriptor(&self) -> &ItemDescriptor {
        &self.descriptor
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every field in source order, duplicates included.
    pub fn fields(&self) -> &[ItemField] {
        &self.fields
    }

    // ─── Section lookups ─────────────────────────────────────────────

    pub fn section_by_id(&self, section_id: &str) -> OpResult<&Section> {
        self.section_index
            .get(section_id)
            .map(|&idx| &self.sections[idx])
            .ok_or_else(|| OpError::section_not_found(format!("'{}'", section_id)))
    }

    pub fn sections_by_label(&self, label: &str) -> OpResult<Vec<&Section>> {
        let found: Vec<&Section> = self
            .sections
            .iter()
            .filter(|s| s.label() == Some(label))
            .collect();
        if found.is_empty() {
            return Err(OpError::section_not_found(format!("labeled '{}'", label)));
        }
        Ok(found)
    }

    pub fn first_section_by_label(&self, label: &str) -> OpResult<&Section> {
        Ok(self.sections_by_label(label)?[0])
    }

    // ─── Field lookups ───────────────────────────────────────────────

    pub fn field_by_id(&self, field_id: &str) -> OpResult<&ItemField> {
        self.field_index
            .get(field_id)
            .map(|&idx| &self.fields[idx])
            .ok_or_else(|| OpError::field_not_found(format!("'{}'", field_id)))
    }

    pub fn fields_by_label(&self, label: &str) -> OpResult<Vec<&ItemField>> {
        let found: Vec<&ItemField> = self
            .fields
            .iter()
            .filter(|f| f.label() == Some(label))
            .collect();
        if found.is_empty() {
            return Err(OpError::field_not_found(format!("labeled '{}'", label)));
        }
        Ok(found)
    }

    pub fn first_field_by_label(&self, label: &str) -> OpResult<&ItemField> {
        Ok(self.fields_by_label(label)?[0])
    }

    pub fn fields_by_purpose(&self, purpose: &FieldPurpose) -> Vec<&ItemField> {
        self.fields
            .iter()
            .filter(|f| f.purpose() == Some(purpose))
            .collect()
    }

    /// String value of a field; `Ok(None)` when the field exists but has
    /// no string value.
    pub fn field_value_by_id(&self, field_id: &str) -> OpResult<Option<&str>> {
        Ok(self.field_by_id(field_id)?.value_str())
    }

    /// Value of the first field labeled `field_label` inside the first
    /// section labeled `section_label`.
    pub fn field_value_by_section_label(
        &self,
        section_label: &str,
        field_label: &str,
    ) -> OpResult<Option<&str>> {
        let section = self.first_section_by_label(section_label)?;
        Ok(section.first_field_by_label(field_label)?.value_str())
    }

    // ─── Serialization ───────────────────────────────────────────────

    pub fn to_value(&self) -> OpResult<Value> {
        serde_json::to_value(self.as_record())
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize item: {}", e)))
    }

    pub fn to_json(&self) -> OpResult<String> {
        serde_json::to_string(&self.as_record())
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize item: {}", e)))
    }

    fn as_record(&self) -> ItemRecordRef<'_> {
        ItemRecordRef {
            descriptor: &self.descriptor,
            sections: &self.sections,
            fields: &self.fields,
        }
    }
}

impl Deref for FullItem {
    type Target = ItemDescriptor;

    fn deref(&self) -> &ItemDescriptor {
        &self.descriptor
    }
}

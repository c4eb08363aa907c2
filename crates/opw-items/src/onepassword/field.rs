use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{generate_unique_id, is_generated_id};
use super::section::NewSection;
use super::totp::NewTotpUri;
use super::types::*;

// ─── Section back-reference ──────────────────────────────────────────

/// `section` object on a field: a weak reference by ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSectionRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSectionRef {
    pub fn to_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

// ─── Existing field ──────────────────────────────────────────────────

/// A field read from `op` output. Immutable once parsed; every accessor is
/// a projection that returns `None` when the key is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purpose: Option<FieldPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    section: Option<FieldSectionRef>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ItemField {
    /// Take ownership of a raw field record.
    pub fn from_value(value: Value) -> OpResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| OpError::invalid_item(format!("Malformed field record: {}", e)))
    }

    /// Field ID, or `""` for an ID-less field.
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    pub fn field_type(&self) -> Option<&FieldType> {
        self.field_type.as_ref()
    }

    pub fn purpose(&self) -> Option<&FieldPurpose> {
        self.purpose.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The value when it is a JSON string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn entropy(&self) -> Option<f64> {
        self.entropy
    }

    pub fn section_id(&self) -> Option<&str> {
        self.section.as_ref().and_then(|s| s.id.as_deref())
    }

    /// Current one-time code `op` computes for OTP fields.
    pub fn totp_code(&self) -> Option<&str> {
        self.extra.get("totp").and_then(Value::as_str)
    }

    /// Keys the model does not interpret, e.g. `password_details`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

// ─── New field ───────────────────────────────────────────────────────

/// A field to be submitted to `op item create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    id: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    label: String,
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purpose: Option<FieldPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    section: Option<FieldSectionRef>,
}

impl NewField {
    /// New field with a freshly generated ID and no section.
    pub fn new(field_type: FieldType, label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: generate_unique_id(),
            field_type,
            label: label.into(),
            value: value.into(),
            purpose: None,
            section: None,
        }
    }

    /// Construct from `(label, value, id?, section?)`.
    pub fn from_parts(
        field_type: FieldType,
        label: impl Into<String>,
        value: impl Into<Value>,
        id: Option<&str>,
        section: Option<&NewSection>,
    ) -> Self {
        let mut field = Self::new(field_type, label, value);
        if let Some(id) = id {
            field.id = id.to_string();
        }
        if let Some(section) = section {
            field.link_section(section);
        }
        field
    }

    pub fn string(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(FieldType::String, label, value.into())
    }

    pub fn concealed(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(FieldType::Concealed, label, value.into())
    }

    /// One-time password field holding an `otpauth://` URI.
    pub fn totp(label: impl Into<String>, uri: &NewTotpUri) -> Self {
        Self::new(FieldType::Otp, label, uri.to_string())
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_purpose(mut self, purpose: FieldPurpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn in_section(mut self, section: &NewSection) -> Self {
        self.link_section(section);
        self
    }

    pub(crate) fn link_section(&mut self, section: &NewSection) {
        self.section = Some(FieldSectionRef::to_id(section.id()));
    }

    /// Re-resolve an existing field for submission as part of a new item.
    /// Generated-shaped IDs are replaced; stable IDs such as `username`
    /// are kept. The field is linked to `section` when one is given.
    pub fn from_field(field: &ItemField, section: Option<&NewSection>) -> Self {
        let id = if field.has_id() && !is_generated_id(field.id()) {
            field.id().to_string()
        } else {
            generate_unique_id()
        };
        let mut new_field = Self {
            id,
            field_type: field.field_type().cloned().unwrap_or(FieldType::String),
            label: field.label().unwrap_or_default().to_string(),
            value: field.value().cloned().unwrap_or_else(|| Value::String(String::new())),
            purpose: field.purpose().cloned(),
            section: None,
        };
        if let Some(section) = section {
            new_field.link_section(section);
        }
        new_field
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn purpose(&self) -> Option<&FieldPurpose> {
        self.purpose.as_ref()
    }

    pub fn section_id(&self) -> Option<&str> {
        self.section.as_ref().and_then(|s| s.id.as_deref())
    }
}

use std::collections::HashMap;

use serde_json::{json, Value};

use super::types::*;

/// Lookup of the template record `op item template get` returns for a
/// category.
pub trait TemplateSource {
    fn template(&self, category: &ItemCategory) -> OpResult<Value>;
}

/// In-memory template directory keyed by category discriminator.
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    templates: HashMap<String, Value>,
}

impl TemplateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Templates for the built-in categories.
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for category in [
            ItemCategory::Login,
            ItemCategory::Password,
            ItemCategory::ApiCredential,
            ItemCategory::Server,
            ItemCategory::Database,
            ItemCategory::SshKey,
            ItemCategory::SecureNote,
            ItemCategory::CreditCard,
            ItemCategory::Identity,
            ItemCategory::Document,
        ] {
            let fields = default_fields(&category);
            map.insert(
                category.clone(),
                json!({
                    "title": "",
                    "category": category.as_str(),
                    "sections": [],
                    "fields": fields,
                }),
            );
        }
        map
    }

    pub fn insert(&mut self, category: ItemCategory, template: Value) {
        self.templates.insert(category.as_str().to_string(), template);
    }

    /// Add a template from `op item template get --format json` output.
    pub fn insert_json(&mut self, category: ItemCategory, text: &str) -> OpResult<()> {
        let template: Value = serde_json::from_str(text).map_err(|e| {
            OpError::template(format!("Malformed template for '{}': {}", category, e))
        })?;
        if !template.is_object() {
            return Err(OpError::template(format!(
                "Template for '{}' is not a JSON object",
                category
            )));
        }
        self.insert(category, template);
        Ok(())
    }

    pub fn contains(&self, category: &ItemCategory) -> bool {
        self.templates.contains_key(category.as_str())
    }
}

impl TemplateSource for TemplateMap {
    fn template(&self, category: &ItemCategory) -> OpResult<Value> {
        self.templates
            .get(category.as_str())
            .cloned()
            .ok_or_else(|| OpError::template(format!("No template for category '{}'", category)))
    }
}

fn template_field(id: &str, field_type: FieldType, purpose: Option<FieldPurpose>) -> Value {
    let mut field = json!({
        "id": id,
        "type": field_type.as_str(),
        "label": id,
        "value": "",
    });
    if let Some(purpose) = purpose {
        field["purpose"] = Value::String(purpose.as_str().to_string());
    }
    field
}

fn default_fields(category: &ItemCategory) -> Vec<Value> {
    use FieldPurpose::*;
    match category {
        ItemCategory::Login => vec![
            template_field("username", FieldType::String, Some(Username)),
            template_field("password", FieldType::Concealed, Some(Password)),
            template_field("notesPlain", FieldType::String, Some(Notes)),
        ],
        ItemCategory::Password => vec![
            template_field("password", FieldType::Concealed, Some(Password)),
            template_field("notesPlain", FieldType::String, Some(Notes)),
        ],
        ItemCategory::ApiCredential => vec![
            template_field("username", FieldType::String, None),
            template_field("credential", FieldType::Concealed, None),
            template_field("type", FieldType::Menu, None),
            template_field("filename", FieldType::String, None),
            template_field("validFrom", FieldType::Date, None),
            template_field("expires", FieldType::Date, None),
            template_field("hostname", FieldType::String, None),
        ],
        ItemCategory::Server => vec![
            template_field("url", FieldType::String, None),
            template_field("username", FieldType::String, None),
            template_field("password", FieldType::Concealed, None),
        ],
        ItemCategory::Database => vec![
            template_field("database_type", FieldType::Menu, None),
            template_field("hostname", FieldType::String, None),
            template_field("port", FieldType::String, None),
            template_field("database", FieldType::String, None),
            template_field("username", FieldType::String, None),
            template_field("password", FieldType::Concealed, None),
        ],
        ItemCategory::SshKey => vec![
            template_field("private_key", FieldType::SshKey, None),
            template_field("notesPlain", FieldType::String, Some(Notes)),
        ],
        ItemCategory::CreditCard => vec![
            template_field("cardholder", FieldType::String, None),
            template_field("type", FieldType::CreditCardType, None),
            template_field("ccnum", FieldType::CreditCardNumber, None),
            template_field("cvv", FieldType::Concealed, None),
            template_field("expiry", FieldType::MonthYear, None),
            template_field("validFrom", FieldType::MonthYear, None),
        ],
        _ => vec![template_field("notesPlain", FieldType::String, Some(Notes))],
    }
}

//! Construction of items to submit with `op item create --template`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde_json::{Map, Value};

use super::descriptor::ItemUrl;
use super::field::{ItemField, NewField};
use super::scratch::ScratchFiles;
use super::section::{NewSection, Section};
use super::templates::TemplateSource;
use super::totp::NewTotpUri;
use super::types::*;

// ─── Inputs ──────────────────────────────────────────────────────────

/// A field supplied to [`NewItem::build`]: either copied from an existing
/// item or already new.
#[derive(Debug, Clone)]
pub enum FieldInput {
    Existing(ItemField),
    New(NewField),
}

impl From<ItemField> for FieldInput {
    fn from(f: ItemField) -> Self {
        FieldInput::Existing(f)
    }
}

impl From<NewField> for FieldInput {
    fn from(f: NewField) -> Self {
        FieldInput::New(f)
    }
}

#[derive(Debug, Clone)]
pub enum SectionInput {
    Existing(Section),
    New(NewSection),
}

impl From<Section> for SectionInput {
    fn from(s: Section) -> Self {
        SectionInput::Existing(s)
    }
}

impl From<NewSection> for SectionInput {
    fn from(s: NewSection) -> Self {
        SectionInput::New(s)
    }
}

// ─── New item ────────────────────────────────────────────────────────

/// An item ready for `op item create`. Owns the scratch file the template
/// is written to.
#[derive(Debug)]
pub struct NewItem {
    category: ItemCategory,
    title: String,
    sections: Vec<NewSection>,
    fields: Vec<NewField>,
    record: Map<String, Value>,
    scratch: ScratchFiles,
}

impl NewItem {
    pub fn build(
        category: ItemCategory,
        title: impl Into<String>,
        fields: Vec<FieldInput>,
        sections: Vec<SectionInput>,
        extra_data: Map<String, Value>,
        templates: &dyn TemplateSource,
    ) -> OpResult<Self> {
        let title = title.into();
        let mut record = match templates.template(&category)? {
            Value::Object(map) => map,
            _ => {
                return Err(OpError::template(format!(
                    "Template for '{}' is not a JSON object",
                    category
                )))
            }
        };
        let template_sections = take_template_sections(&mut record, &category)?;
        let template_fields = take_template_fields(&mut record, &category, &template_sections)?;
        record.insert("title".into(), Value::String(title.clone()));
        record.insert("category".into(), Value::String(category.as_str().to_string()));

        let mut remapped: HashMap<String, NewSection> = HashMap::new();
        let mut new_sections = Vec::with_capacity(sections.len() + template_sections.len());
        for input in sections {
            match input {
                SectionInput::Existing(section) => {
                    let new_section = NewSection::from_section(&section);
                    remapped.insert(section.id().to_string(), new_section.clone());
                    new_sections.push(new_section);
                }
                SectionInput::New(section) => new_sections.push(section),
            }
        }
        let mut seen = HashSet::new();
        for section in &new_sections {
            if !seen.insert(section.id().to_string()) {
                return Err(OpError::section_collision(section.id()));
            }
        }
        // template sections not replaced by a supplied one follow the supplied ones
        for section in template_sections {
            if seen.insert(section.id().to_string()) {
                new_sections.push(section);
            }
        }

        let mut new_fields = Vec::with_capacity(fields.len() + template_fields.len());
        for input in fields {
            match input {
                FieldInput::Existing(field) => {
                    let section = match field.section_id() {
                        None => None,
                        Some(old_id) => Some(
                            remapped
                                .get(old_id)
                                .or_else(|| new_sections.iter().find(|s| s.id() == old_id))
                                .ok_or_else(|| OpError::section_not_found(format!("'{}'", old_id)))?,
                        ),
                    };
                    new_fields.push(NewField::from_field(&field, section));
                }
                FieldInput::New(mut field) => {
                    if let Some(section) = field.section_id().and_then(|id| remapped.get(id)) {
                        let section = section.clone();
                        field.link_section(&section);
                    }
                    new_fields.push(field);
                }
            }
        }
        let supplied: HashSet<String> = new_fields.iter().map(|f| f.id().to_string()).collect();
        new_fields.extend(template_fields.into_iter().filter(|f| !supplied.contains(f.id())));

        for (key, value) in extra_data {
            if record.contains_key(&key) || key == "fields" || key == "sections" {
                return Err(OpError::data_collision(&key));
            }
            record.insert(key, value);
        }

        Ok(Self {
            category,
            title,
            sections: new_sections,
            fields: new_fields,
            record,
            scratch: ScratchFiles::new(),
        })
    }

    pub fn category(&self) -> &ItemCategory {
        &self.category
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[NewSection] {
        &self.sections
    }

    pub fn fields(&self) -> &[NewField] {
        &self.fields
    }

    /// Top-level keys besides `sections` and `fields`.
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// The record in the shape `op item create --template` reads.
    pub fn to_value(&self) -> OpResult<Value> {
        let mut out = self.record.clone();
        let sections = serde_json::to_value(&self.sections)
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize sections: {}", e)))?;
        let fields = serde_json::to_value(&self.fields)
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize fields: {}", e)))?;
        out.insert("sections".into(), sections);
        out.insert("fields".into(), fields);
        Ok(Value::Object(out))
    }

    pub fn to_json(&self) -> OpResult<String> {
        serde_json::to_string(&self.to_value()?)
            .map_err(|e| OpError::invalid_item(format!("Failed to serialize item: {}", e)))
    }

    /// Write the record to a scratch file owned by this item.
    pub fn write_template_file(&mut self) -> OpResult<PathBuf> {
        let json = self.to_json()?;
        self.scratch.create("opw-new-item-", json.as_bytes())
    }

    /// Remove scratch files now rather than on drop.
    pub fn close(&mut self) -> OpResult<()> {
        self.scratch.close()
    }
}

// ─── Template skeleton ───────────────────────────────────────────────

fn template_array(
    record: &mut Map<String, Value>,
    key: &str,
    category: &ItemCategory,
) -> OpResult<Vec<Value>> {
    match record.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(OpError::template(format!(
            "Template '{}' for '{}' is not a list",
            key, category
        ))),
    }
}

/// Default sections of a template. IDs are kept as given so template
/// fields can refer to them.
fn take_template_sections(
    record: &mut Map<String, Value>,
    category: &ItemCategory,
) -> OpResult<Vec<NewSection>> {
    let mut sections = Vec::new();
    for raw in template_array(record, "sections", category)? {
        let section = Section::from_value(raw)
            .map_err(|e| OpError::template(format!("Bad section in '{}' template: {}", category, e)))?;
        if !section.has_id() {
            return Err(OpError::template(format!(
                "Section without an ID in '{}' template",
                category
            )));
        }
        sections.push(NewSection::new(section.label().unwrap_or_default(), Some(section.id())));
    }
    Ok(sections)
}

/// Default fields of a template, linked to the template's own sections.
fn take_template_fields(
    record: &mut Map<String, Value>,
    category: &ItemCategory,
    sections: &[NewSection],
) -> OpResult<Vec<NewField>> {
    let mut fields = Vec::new();
    for raw in template_array(record, "fields", category)? {
        let field = ItemField::from_value(raw)
            .map_err(|e| OpError::template(format!("Bad field in '{}' template: {}", category, e)))?;
        if !field.has_id() {
            return Err(OpError::template(format!(
                "Field without an ID in '{}' template",
                category
            )));
        }
        let section = match field.section_id() {
            None => None,
            Some(id) => Some(sections.iter().find(|s| s.id() == id).ok_or_else(|| {
                OpError::template(format!(
                    "Field '{}' in '{}' template refers to missing section '{}'",
                    field.id(),
                    category,
                    id
                ))
            })?),
        };
        let mut new_field = NewField::from_parts(
            field.field_type().cloned().unwrap_or(FieldType::String),
            field.label().unwrap_or_default(),
            field.value().cloned().unwrap_or_else(|| Value::String(String::new())),
            Some(field.id()),
            section,
        );
        if let Some(purpose) = field.purpose() {
            new_field = new_field.with_purpose(purpose.clone());
        }
        fields.push(new_field);
    }
    Ok(fields)
}

// ─── Login convenience ───────────────────────────────────────────────

/// Builder for the common case of a login with username, password, URLs
/// and an optional one-time password.
#[derive(Debug, Clone)]
pub struct NewLoginItem {
    title: String,
    username: String,
    password: Option<String>,
    urls: Vec<ItemUrl>,
    totp: Option<NewTotpUri>,
    fields: Vec<FieldInput>,
    sections: Vec<SectionInput>,
}

impl NewLoginItem {
    pub fn new(title: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            password: None,
            urls: Vec::new(),
            totp: None,
            fields: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a URL. The first one added is marked primary.
    pub fn with_url(mut self, href: impl Into<String>, label: Option<&str>) -> Self {
        let mut url = ItemUrl::new(href);
        url.label = label.map(str::to_string);
        if self.urls.is_empty() {
            url.primary = Some(true);
        }
        self.urls.push(url);
        self
    }

    pub fn with_totp(mut self, uri: NewTotpUri) -> Self {
        self.totp = Some(uri);
        self
    }

    pub fn with_field(mut self, field: impl Into<FieldInput>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<SectionInput>) -> Self {
        self.sections.push(section.into());
        self
    }

    pub fn build(self, templates: &dyn TemplateSource) -> OpResult<NewItem> {
        let mut fields: Vec<FieldInput> = Vec::with_capacity(self.fields.len() + 3);
        fields.push(
            NewField::string("username", self.username)
                .with_id("username")
                .with_purpose(FieldPurpose::Username)
                .into(),
        );
        if let Some(password) = self.password {
            fields.push(
                NewField::concealed("password", password)
                    .with_id("password")
                    .with_purpose(FieldPurpose::Password)
                    .into(),
            );
        }
        if let Some(uri) = &self.totp {
            fields.push(NewField::totp("one-time password", uri).into());
        }
        fields.extend(self.fields);

        let mut extra = Map::new();
        if !self.urls.is_empty() {
            let urls = serde_json::to_value(&self.urls)
                .map_err(|e| OpError::invalid_item(format!("Failed to serialize URLs: {}", e)))?;
            extra.insert("urls".into(), urls);
        }
        NewItem::build(
            ItemCategory::Login,
            self.title,
            fields,
            self.sections,
            extra,
            templates,
        )
    }
}

//! Per-category item types.
//!
//! Each category wraps a [`FullItem`] and adds domain accessors. The
//! accessors are thin lookups over `field_value_by_id` and
//! `field_value_by_section_label`; they return `FieldNotFound` when the
//! item lacks the field and `Ok(None)` when the field has no value.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::descriptor::ItemUrl;
use super::field::ItemField;
use super::item::FullItem;
use super::types::*;

macro_rules! category_item {
    ($(#[$meta:meta])* $name:ident, $category:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(FullItem);

        impl $name {
            pub const CATEGORY: ItemCategory = $category;

            pub(crate) fn new(item: FullItem) -> Self {
                Self(item)
            }

            pub fn into_inner(self) -> FullItem {
                self.0
            }
        }

        impl Deref for $name {
            type Target = FullItem;

            fn deref(&self) -> &FullItem {
                &self.0
            }
        }
    };
}

category_item!(LoginItem, ItemCategory::Login);
category_item!(PasswordItem, ItemCategory::Password);
category_item!(ServerItem, ItemCategory::Server);
category_item!(DatabaseItem, ItemCategory::Database);
category_item!(DocumentItem, ItemCategory::Document);
category_item!(SshKeyItem, ItemCategory::SshKey);
category_item!(CreditCardItem, ItemCategory::CreditCard);
category_item!(SecureNoteItem, ItemCategory::SecureNote);
category_item!(IdentityItem, ItemCategory::Identity);
category_item!(ApiCredentialItem, ItemCategory::ApiCredential);

// ─── Credential trait ────────────────────────────────────────────────

/// Items that carry a username/secret pair.
pub trait Credential {
    fn full_item(&self) -> &FullItem;

    fn username(&self) -> OpResult<Option<&str>> {
        self.full_item().field_value_by_id("username")
    }

    fn password(&self) -> OpResult<Option<&str>> {
        self.full_item().field_value_by_id("password")
    }
}

impl Credential for LoginItem {
    fn full_item(&self) -> &FullItem {
        &self.0
    }
}

impl Credential for PasswordItem {
    fn full_item(&self) -> &FullItem {
        &self.0
    }
}

impl Credential for ServerItem {
    fn full_item(&self) -> &FullItem {
        &self.0
    }
}

impl Credential for DatabaseItem {
    fn full_item(&self) -> &FullItem {
        &self.0
    }
}

impl Credential for ApiCredentialItem {
    fn full_item(&self) -> &FullItem {
        &self.0
    }

    fn password(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("credential")
    }
}

// ─── Category accessors ──────────────────────────────────────────────

impl LoginItem {
    pub fn urls(&self) -> &[ItemUrl] {
        self.0.urls()
    }

    pub fn primary_url(&self) -> Option<&ItemUrl> {
        self.0.primary_url()
    }

    pub fn notes(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("notesPlain")
    }

    /// The first OTP field, if any.
    pub fn totp_field(&self) -> Option<&ItemField> {
        self.0
            .fields()
            .iter()
            .find(|f| f.field_type() == Some(&FieldType::Otp))
    }
}

impl ServerItem {
    pub fn url(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("url")
    }

    pub fn admin_console_url(&self) -> OpResult<Option<&str>> {
        self.0
            .field_value_by_section_label("Admin Console", "admin console URL")
    }

    pub fn hosting_provider(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_section_label("Hosting Provider", "name")
    }
}

impl DatabaseItem {
    pub fn database_type(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("database_type")
    }

    pub fn hostname(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("hostname")
    }

    pub fn port(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("port")
    }

    pub fn database(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("database")
    }

    pub fn sid(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("sid")
    }

    pub fn alias(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("alias")
    }

    pub fn options(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("options")
    }
}

/// Attachment entry in a document item's `files` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
}

impl DocumentItem {
    pub fn files(&self) -> OpResult<Vec<DocumentFile>> {
        match self.0.extra().get("files") {
            None => Ok(Vec::new()),
            Some(files) => serde_json::from_value(files.clone())
                .map_err(|e| OpError::invalid_item(format!("Malformed document files: {}", e))),
        }
    }

    /// Name of the first attached file.
    pub fn file_name(&self) -> OpResult<Option<String>> {
        Ok(self.files()?.into_iter().next().map(|f| f.name))
    }
}

impl SshKeyItem {
    pub fn private_key(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("private_key")
    }

    pub fn public_key(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("public_key")
    }

    pub fn fingerprint(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("fingerprint")
    }

    pub fn key_type(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("key_type")
    }
}

impl CreditCardItem {
    pub fn cardholder(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("cardholder")
    }

    pub fn card_type(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("type")
    }

    pub fn number(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("ccnum")
    }

    pub fn verification_number(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("cvv")
    }

    pub fn expiry(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("expiry")
    }

    pub fn valid_from(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("validFrom")
    }
}

impl SecureNoteItem {
    pub fn notes(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("notesPlain")
    }
}

impl IdentityItem {
    pub fn first_name(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_section_label("Identification", "first name")
    }

    pub fn last_name(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_section_label("Identification", "last name")
    }

    pub fn email(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_section_label("Internet Details", "email")
    }
}

impl ApiCredentialItem {
    pub fn credential(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("credential")
    }

    pub fn credential_type(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("type")
    }

    pub fn filename(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("filename")
    }

    pub fn valid_from(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("validFrom")
    }

    pub fn expires(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("expires")
    }

    pub fn hostname(&self) -> OpResult<Option<&str>> {
        self.0.field_value_by_id("hostname")
    }
}

// ─── Item enum ───────────────────────────────────────────────────────

/// A parsed item, classified by category.
#[derive(Debug, Clone)]
pub enum Item {
    Login(LoginItem),
    Password(PasswordItem),
    Server(ServerItem),
    Database(DatabaseItem),
    Document(DocumentItem),
    SshKey(SshKeyItem),
    CreditCard(CreditCardItem),
    SecureNote(SecureNoteItem),
    Identity(IdentityItem),
    ApiCredential(ApiCredentialItem),
    /// A category with no dedicated type, accepted because the caller
    /// allowed generic items.
    Generic(FullItem),
}

impl Item {
    pub fn full(&self) -> &FullItem {
        match self {
            Item::Login(i) => &i.0,
            Item::Password(i) => &i.0,
            Item::Server(i) => &i.0,
            Item::Database(i) => &i.0,
            Item::Document(i) => &i.0,
            Item::SshKey(i) => &i.0,
            Item::CreditCard(i) => &i.0,
            Item::SecureNote(i) => &i.0,
            Item::Identity(i) => &i.0,
            Item::ApiCredential(i) => &i.0,
            Item::Generic(i) => i,
        }
    }

    pub fn into_full(self) -> FullItem {
        match self {
            Item::Login(i) => i.into_inner(),
            Item::Password(i) => i.into_inner(),
            Item::Server(i) => i.into_inner(),
            Item::Database(i) => i.into_inner(),
            Item::Document(i) => i.into_inner(),
            Item::SshKey(i) => i.into_inner(),
            Item::CreditCard(i) => i.into_inner(),
            Item::SecureNote(i) => i.into_inner(),
            Item::Identity(i) => i.into_inner(),
            Item::ApiCredential(i) => i.into_inner(),
            Item::Generic(i) => i,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Item::Generic(_))
    }

    /// Username/secret view for credential-bearing categories.
    pub fn as_credential(&self) -> Option<&dyn Credential> {
        match self {
            Item::Login(i) => Some(i as &dyn Credential),
            Item::Password(i) => Some(i as &dyn Credential),
            Item::Server(i) => Some(i as &dyn Credential),
            Item::Database(i) => Some(i as &dyn Credential),
            Item::ApiCredential(i) => Some(i as &dyn Credential),
            _ => None,
        }
    }

    pub fn to_value(&self) -> OpResult<Value> {
        self.full().to_value()
    }
}

impl Deref for Item {
    type Target = FullItem;

    fn deref(&self) -> &FullItem {
        self.full()
    }
}

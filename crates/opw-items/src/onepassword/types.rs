use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ─── Error types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpErrorKind {
    /// Category discriminator missing from the registry.
    UnknownItemType,
    /// Unparseable input or a structural violation strict mode rejects.
    InvalidItem,
    FieldNotFound,
    SectionNotFound,
    FieldCollision,
    SectionCollision,
    /// An extra top-level key on a new item clashes with the template.
    DataCollision,
    NewTotpUri,
    TimestampFormat,
    Template,
    IoError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpError {
    pub kind: OpErrorKind,
    pub message: String,
    /// The offending record, kept for diagnostics.
    pub record: Option<Value>,
}

pub type OpResult<T> = Result<T, OpError>;

impl OpError {
    pub fn new(kind: OpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            record: None,
        }
    }

    pub fn with_record(mut self, record: Value) -> Self {
        self.record = Some(record);
        self
    }

    pub fn unknown_item_type(category: &str) -> Self {
        Self::new(
            OpErrorKind::UnknownItemType,
            format!("Unknown item category '{}'", category),
        )
    }

    pub fn invalid_item(msg: impl Into<String>) -> Self {
        Self::new(OpErrorKind::InvalidItem, msg)
    }

    pub fn field_not_found(what: impl fmt::Display) -> Self {
        Self::new(
            OpErrorKind::FieldNotFound,
            format!("Field {} not found", what),
        )
    }

    pub fn section_not_found(what: impl fmt::Display) -> Self {
        Self::new(
            OpErrorKind::SectionNotFound,
            format!("Section {} not found", what),
        )
    }

    pub fn field_collision(id: &str) -> Self {
        Self::new(
            OpErrorKind::FieldCollision,
            format!("Field ID '{}' is already registered", id),
        )
    }

    pub fn section_collision(id: &str) -> Self {
        Self::new(
            OpErrorKind::SectionCollision,
            format!("Section ID '{}' is already registered", id),
        )
    }

    pub fn data_collision(key: &str) -> Self {
        Self::new(
            OpErrorKind::DataCollision,
            format!("Extra item data key '{}' collides with an existing key", key),
        )
    }

    pub fn new_totp_uri(msg: impl Into<String>) -> Self {
        Self::new(OpErrorKind::NewTotpUri, msg)
    }

    pub fn timestamp_format(raw: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            OpErrorKind::TimestampFormat,
            format!("Invalid ISO-8601 timestamp '{}': {}", raw, reason),
        )
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::new(OpErrorKind::Template, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(OpErrorKind::IoError, msg)
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[op {:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for OpError {}

impl From<OpError> for String {
    fn from(e: OpError) -> String {
        e.message
    }
}

impl From<std::io::Error> for OpError {
    fn from(e: std::io::Error) -> Self {
        Self::io(format!("I/O error: {}", e))
    }
}

// ─── Validation ──────────────────────────────────────────────────────

/// How tolerant item parsing is of malformed `op` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Strict,
    /// Accepts missing section/field IDs and duplicate IDs.
    Relaxed,
}

impl ValidationMode {
    pub fn is_relaxed(self) -> bool {
        self == ValidationMode::Relaxed
    }
}

/// Parser configuration passed into every parse call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    pub mode: ValidationMode,
    /// Fall back to a generic item for unregistered categories.
    pub generic_okay: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn relaxed() -> Self {
        Self {
            mode: ValidationMode::Relaxed,
            generic_okay: false,
        }
    }

    pub fn with_generic(mut self, generic_okay: bool) -> Self {
        self.generic_okay = generic_okay;
        self
    }
}

// ─── Timestamps ──────────────────────────────────────────────────────

/// Parse an `op` ISO-8601 timestamp. A trailing `Z` is rewritten to
/// `+00:00`; a string without any zone designator is rejected.
pub fn parse_timestamp(raw: &str) -> OpResult<DateTime<FixedOffset>> {
    let normalized = match raw.strip_suffix('Z') {
        Some(stem) => format!("{}+00:00", stem),
        None => raw.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalized).map_err(|e| OpError::timestamp_format(raw, e))
}

// ─── Item Categories ─────────────────────────────────────────────────

/// Item category discriminator (`category` key). Unrecognised values are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemCategory {
    Login,
    Password,
    ApiCredential,
    Server,
    Database,
    CreditCard,
    Membership,
    Passport,
    SoftwareLicense,
    OutdoorLicense,
    SecureNote,
    WirelessRouter,
    BankAccount,
    DriverLicense,
    Identity,
    RewardProgram,
    Document,
    EmailAccount,
    SocialSecurityNumber,
    MedicalRecord,
    SshKey,
    Custom,
    Other(String),
}

impl Default for ItemCategory {
    fn default() -> Self {
        ItemCategory::Other(String::new())
    }
}

impl ItemCategory {
    /// All categories `op` documents.
    pub fn all() -> Vec<ItemCategory> {
        vec![
            ItemCategory::Login,
            ItemCategory::Password,
            ItemCategory::ApiCredential,
            ItemCategory::Server,
            ItemCategory::Database,
            ItemCategory::CreditCard,
            ItemCategory::Membership,
            ItemCategory::Passport,
            ItemCategory::SoftwareLicense,
            ItemCategory::OutdoorLicense,
            ItemCategory::SecureNote,
            ItemCategory::WirelessRouter,
            ItemCategory::BankAccount,
            ItemCategory::DriverLicense,
            ItemCategory::Identity,
            ItemCategory::RewardProgram,
            ItemCategory::Document,
            ItemCategory::EmailAccount,
            ItemCategory::SocialSecurityNumber,
            ItemCategory::MedicalRecord,
            ItemCategory::SshKey,
            ItemCategory::Custom,
        ]
    }

    /// The JSON discriminator, e.g. `API_CREDENTIAL`.
    pub fn as_str(&self) -> &str {
        match self {
            ItemCategory::Login => "LOGIN",
            ItemCategory::Password => "PASSWORD",
            ItemCategory::ApiCredential => "API_CREDENTIAL",
            ItemCategory::Server => "SERVER",
            ItemCategory::Database => "DATABASE",
            ItemCategory::CreditCard => "CREDIT_CARD",
            ItemCategory::Membership => "MEMBERSHIP",
            ItemCategory::Passport => "PASSPORT",
            ItemCategory::SoftwareLicense => "SOFTWARE_LICENSE",
            ItemCategory::OutdoorLicense => "OUTDOOR_LICENSE",
            ItemCategory::SecureNote => "SECURE_NOTE",
            ItemCategory::WirelessRouter => "WIRELESS_ROUTER",
            ItemCategory::BankAccount => "BANK_ACCOUNT",
            ItemCategory::DriverLicense => "DRIVER_LICENSE",
            ItemCategory::Identity => "IDENTITY",
            ItemCategory::RewardProgram => "REWARD_PROGRAM",
            ItemCategory::Document => "DOCUMENT",
            ItemCategory::EmailAccount => "EMAIL_ACCOUNT",
            ItemCategory::SocialSecurityNumber => "SOCIAL_SECURITY_NUMBER",
            ItemCategory::MedicalRecord => "MEDICAL_RECORD",
            ItemCategory::SshKey => "SSH_KEY",
            ItemCategory::Custom => "CUSTOM",
            ItemCategory::Other(s) => s,
        }
    }

    /// Human-readable name, as accepted by `op item list --categories`.
    pub fn label(&self) -> &str {
        match self {
            ItemCategory::Login => "Login",
            ItemCategory::Password => "Password",
            ItemCategory::ApiCredential => "API Credential",
            ItemCategory::Server => "Server",
            ItemCategory::Database => "Database",
            ItemCategory::CreditCard => "Credit Card",
            ItemCategory::Membership => "Membership",
            ItemCategory::Passport => "Passport",
            ItemCategory::SoftwareLicense => "Software License",
            ItemCategory::OutdoorLicense => "Outdoor License",
            ItemCategory::SecureNote => "Secure Note",
            ItemCategory::WirelessRouter => "Wireless Router",
            ItemCategory::BankAccount => "Bank Account",
            ItemCategory::DriverLicense => "Driver License",
            ItemCategory::Identity => "Identity",
            ItemCategory::RewardProgram => "Reward Program",
            ItemCategory::Document => "Document",
            ItemCategory::EmailAccount => "Email Account",
            ItemCategory::SocialSecurityNumber => "Social Security Number",
            ItemCategory::MedicalRecord => "Medical Record",
            ItemCategory::SshKey => "SSH Key",
            ItemCategory::Custom => "Custom",
            ItemCategory::Other(s) => s,
        }
    }
}

impl From<String> for ItemCategory {
    fn from(s: String) -> Self {
        ItemCategory::all()
            .into_iter()
            .find(|c| c.as_str() == s)
            .unwrap_or(ItemCategory::Other(s))
    }
}

impl From<&str> for ItemCategory {
    fn from(s: &str) -> Self {
        ItemCategory::from(s.to_string())
    }
}

impl From<ItemCategory> for String {
    fn from(c: ItemCategory) -> String {
        match c {
            ItemCategory::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Field type / purpose ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Concealed,
    Email,
    Url,
    Otp,
    Date,
    MonthYear,
    Menu,
    Phone,
    Address,
    Reference,
    SshKey,
    CreditCardType,
    CreditCardNumber,
    Unknown(String),
}

impl FieldType {
    const KNOWN: [(FieldType, &'static str); 14] = [
        (FieldType::String, "STRING"),
        (FieldType::Concealed, "CONCEALED"),
        (FieldType::Email, "EMAIL"),
        (FieldType::Url, "URL"),
        (FieldType::Otp, "OTP"),
        (FieldType::Date, "DATE"),
        (FieldType::MonthYear, "MONTH_YEAR"),
        (FieldType::Menu, "MENU"),
        (FieldType::Phone, "PHONE"),
        (FieldType::Address, "ADDRESS"),
        (FieldType::Reference, "REFERENCE"),
        (FieldType::SshKey, "SSHKEY"),
        (FieldType::CreditCardType, "CREDIT_CARD_TYPE"),
        (FieldType::CreditCardNumber, "CREDIT_CARD_NUMBER"),
    ];

    pub fn as_str(&self) -> &str {
        if let FieldType::Unknown(s) = self {
            return s;
        }
        Self::KNOWN
            .iter()
            .find(|(t, _)| t == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        Self::KNOWN
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(t, _)| t.clone())
            .unwrap_or(FieldType::Unknown(s))
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> String {
        match t {
            FieldType::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic hint `op` attaches to built-in fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldPurpose {
    Username,
    Password,
    Notes,
    Other(String),
}

impl FieldPurpose {
    pub fn as_str(&self) -> &str {
        match self {
            FieldPurpose::Username => "USERNAME",
            FieldPurpose::Password => "PASSWORD",
            FieldPurpose::Notes => "NOTES",
            FieldPurpose::Other(s) => s,
        }
    }
}

impl From<String> for FieldPurpose {
    fn from(s: String) -> Self {
        match s.as_str() {
            "USERNAME" => FieldPurpose::Username,
            "PASSWORD" => FieldPurpose::Password,
            "NOTES" => FieldPurpose::Notes,
            _ => FieldPurpose::Other(s),
        }
    }
}

impl From<FieldPurpose> for String {
    fn from(p: FieldPurpose) -> String {
        match p {
            FieldPurpose::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

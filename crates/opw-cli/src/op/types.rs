use opw_items::{OpError, ParseOptions, ValidationMode};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpCliConfig {
    /// Path to the `op` executable.
    #[serde(default = "default_op_path")]
    pub op_path: String,

    /// Account shorthand, sign-in address or ID passed as `--account`.
    #[serde(default)]
    pub account: Option<String>,

    /// Session token from an earlier `op signin`, passed to `op` as
    /// `OP_SESSION_<account>`. Requires `account`.
    #[serde(default)]
    pub session_token: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub validation: ValidationMode,

    /// Accept items whose category has no dedicated type.
    #[serde(default)]
    pub generic_okay: bool,
}

fn default_op_path() -> String {
    "op".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for OpCliConfig {
    fn default() -> Self {
        Self {
            op_path: default_op_path(),
            account: None,
            session_token: None,
            timeout_secs: default_timeout(),
            validation: ValidationMode::default(),
            generic_okay: false,
        }
    }
}

impl OpCliConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            mode: self.validation,
            generic_okay: self.generic_okay,
        }
    }
}

// ─── Error types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpCliErrorKind {
    CliNotFound,
    CommandFailed,
    NotSignedIn,
    NotFound,
    Timeout,
    Io,
    Parse,
    /// Output parsed as JSON but failed item validation.
    Item,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpCliError {
    pub kind: OpCliErrorKind,
    pub message: String,
    pub exit_code: Option<i32>,
}

impl OpCliError {
    pub fn new(kind: OpCliErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn cli_not_found(msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::CliNotFound, msg)
    }

    pub fn command_failed(code: i32, msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::CommandFailed, msg).with_exit_code(code)
    }

    pub fn not_signed_in(msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::NotSignedIn, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::NotFound, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::Timeout, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::Io, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(OpCliErrorKind::Parse, msg)
    }
}

impl fmt::Display for OpCliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "[op-cli {:?} exit {}] {}", self.kind, code, self.message),
            None => write!(f, "[op-cli {:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for OpCliError {}

impl From<OpCliError> for String {
    fn from(e: OpCliError) -> String {
        e.message
    }
}

impl From<OpError> for OpCliError {
    fn from(e: OpError) -> Self {
        Self::new(OpCliErrorKind::Item, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = OpCliConfig::default();
        assert_eq!(config.op_path, "op");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.parse_options(), ParseOptions::strict());
    }

    #[test]
    fn config_from_partial_json() {
        let config: OpCliConfig =
            serde_json::from_str(r#"{"account":"my","validation":"relaxed","generic_okay":true}"#).unwrap();
        assert_eq!(config.op_path, "op");
        assert_eq!(config.account.as_deref(), Some("my"));
        assert!(config.parse_options().mode.is_relaxed());
        assert!(config.parse_options().generic_okay);
    }

    #[test]
    fn error_display_carries_exit_code() {
        let err = OpCliError::command_failed(1, "boom");
        assert_eq!(err.to_string(), "[op-cli CommandFailed exit 1] boom");
        assert_eq!(OpCliError::timeout("slow").to_string(), "[op-cli Timeout] slow");
    }

    #[test]
    fn item_errors_convert() {
        let err: OpCliError = OpError::field_not_found("'x'").into();
        assert_eq!(err.kind, OpCliErrorKind::Item);
        assert!(err.message.contains("FieldNotFound"));
    }
}

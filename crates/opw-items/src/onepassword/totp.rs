//! `otpauth://` URI construction for new one-time-password fields.
//!
//! Format: `otpauth://totp/ISSUER:ACCOUNT?secret=BASE32&issuer=ISSUER`

use std::fmt;

use super::types::*;

/// A validated TOTP key URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTotpUri {
    secret: String,
    account_name: String,
    issuer: Option<String>,
}

impl NewTotpUri {
    /// Validate `secret` as base32 and build the URI parts. Whitespace is
    /// stripped and the secret uppercased before validation.
    pub fn new(secret: &str, account_name: &str, issuer: Option<&str>) -> OpResult<Self> {
        let cleaned: String = secret
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        validate_base32(&cleaned)?;
        Ok(Self {
            secret: cleaned,
            account_name: account_name.to_string(),
            issuer: issuer.filter(|i| !i.is_empty()).map(str::to_string),
        })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }
}

impl fmt::Display for NewTotpUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let account = url_encode(&self.account_name);
        match &self.issuer {
            Some(issuer) => {
                let issuer = url_encode(issuer);
                write!(
                    f,
                    "otpauth://totp/{}:{}?secret={}&issuer={}",
                    issuer, account, self.secret, issuer
                )
            }
            None => write!(f, "otpauth://totp/{}?secret={}", account, self.secret),
        }
    }
}

fn validate_base32(secret: &str) -> OpResult<()> {
    if secret.is_empty() {
        return Err(OpError::new_totp_uri("TOTP secret is empty"));
    }
    let invalid = || OpError::new_totp_uri(format!("Invalid base32 TOTP secret '{}'", secret));
    let padded = pad_base32(secret.trim_end_matches('='));
    // a final quantum of 2, 4, 5, 7 or 8 symbols leaves 6, 4, 3, 1 or 0 pad chars
    let pad_count = padded.len() - padded.trim_end_matches('=').len();
    if !matches!(pad_count, 0 | 1 | 3 | 4 | 6) {
        return Err(invalid());
    }
    base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
        .map(|_| ())
        .ok_or_else(invalid)
}

/// Pad a base32 string to a multiple of 8 with '='.
fn pad_base32(s: &str) -> String {
    let remainder = s.len() % 8;
    if remainder == 0 {
        s.to_string()
    } else {
        format!("{}{}", s, "=".repeat(8 - remainder))
    }
}

fn url_encode(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(byte as char);
            }
            _ => output.push_str(&format!("%{:02X}", byte)),
        }
    }
    output
}

//! License key descriptors for the DRM-capable player.
//!
//! Format: `{license_url}|{urlencoded headers}|{key value}|`. The last
//! segment is always empty. `{SSM}` is a literal placeholder the player
//! replaces with the license challenge; it is passed through as-is.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{PlayError, Result};

/// Literal token the player substitutes with session material.
pub const SSM_PLACEHOLDER: &str = "{SSM}";

/// Characters left bare in header names and values; space becomes `+`.
const HEADER_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Header set plus `/`, which the player expects unescaped in key values.
const VALUE_SET: &AsciiSet = &HEADER_SET.remove(b'/');

/// How the player wraps the license challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Base64 challenge appended as-is.
    A,
    /// Raw challenge bytes.
    R,
    /// Base64 challenge, URL-encoded.
    B,
    /// Caller-supplied value containing `D{SSM}`.
    D,
}

impl KeyType {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::A => "A",
            KeyType::R => "R",
            KeyType::B => "B",
            KeyType::D => "D",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(KeyType::A),
            "R" | "r" => Ok(KeyType::R),
            "B" | "b" => Ok(KeyType::B),
            "D" | "d" => Ok(KeyType::D),
            other => Err(format!("unknown key type '{other}' (expected A, R, B or D)")),
        }
    }
}

/// Build the license key string for `license_url`.
///
/// `headers` are form-encoded in the given order, keeping `_.-~` and
/// escaping everything else. For [`KeyType::D`], `key_value` must contain
/// `D{SSM}` and is percent-encoded with `/` kept; the other key types
/// ignore `key_value` and use `{type}{SSM}`.
pub fn create_license_key(
    license_url: &str,
    key_type: KeyType,
    headers: &[(&str, &str)],
    key_value: Option<&str>,
) -> Result<String> {
    let value = match key_type {
        KeyType::D => {
            let raw = key_value.unwrap_or_default();
            if !raw.contains("D{SSM}") {
                return Err(PlayError::MissingPlaceholder);
            }
            utf8_percent_encode(raw, VALUE_SET).to_string()
        }
        other => format!("{other}{SSM_PLACEHOLDER}"),
    };

    let header_block = headers
        .iter()
        .map(|(name, value)| format!("{}={}", encode_form(name), encode_form(value)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("{license_url}|{header_block}|{value}|"))
}

fn encode_form(raw: &str) -> String {
    utf8_percent_encode(raw, HEADER_SET)
        .to_string()
        .replace("%20", "+")
}

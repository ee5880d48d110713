//! # Ledger Identifiers
//!
//! Account addresses and object identifiers share one textual form: `0x`
//! followed by 1 to 64 hex digits. Parsing reduces every spelling of the same
//! 32-byte value to one canonical form (lowercase, leading zeros stripped, so
//! `0x0B0B`, `0xb0b` and the 64-digit form are equal). That makes identifiers
//! safe to use as join keys between optimistic local state and refreshed
//! remote state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of hex digits in an identifier (32 bytes).
pub const MAX_HEX_DIGITS: usize = 64;

/// Reasons an identifier string was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// Input was empty or whitespace only
    #[error("identifier is empty")]
    Empty,
    /// Input does not start with `0x`
    #[error("identifier `{0}` is missing the 0x prefix")]
    MissingPrefix(String),
    /// Digit count outside `1..=64`
    #[error("identifier `{value}` has {digits} hex digits (expected 1..={MAX_HEX_DIGITS})")]
    BadLength {
        /// Offending input
        value: String,
        /// Number of digits after the prefix
        digits: usize,
    },
    /// Non-hex characters after the prefix
    #[error("identifier `{0}` contains non-hex characters")]
    NotHex(String),
}

fn normalize(raw: &str) -> Result<String, IdParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdParseError::Empty);
    }

    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| IdParseError::MissingPrefix(trimmed.to_string()))?;

    if digits.is_empty() || digits.len() > MAX_HEX_DIGITS {
        return Err(IdParseError::BadLength {
            value: trimmed.to_string(),
            digits: digits.len(),
        });
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IdParseError::NotHex(trimmed.to_string()));
    }

    Ok(canonical(digits))
}

fn canonical(digits: &str) -> String {
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", significant.to_ascii_lowercase())
    }
}

/// Canonical form of a fully qualified type such as `0x00ab::module::Struct`.
///
/// Only the leading address is rewritten; tags without one come back as-is.
pub fn canonical_type_tag(tag: &str) -> String {
    match tag.split_once("::") {
        Some((address, rest)) => match normalize(address) {
            Ok(address) => format!("{address}::{rest}"),
            Err(_) => tag.to_string(),
        },
        None => tag.to_string(),
    }
}

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and normalize an identifier.
            pub fn parse(raw: &str) -> Result<Self, IdParseError> {
                normalize(raw).map(Self)
            }

            /// Build an identifier from 32 raw bytes.
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(canonical(&hex::encode(bytes)))
            }

            /// Decode into 32 bytes, left-padding short forms with zeros.
            pub fn to_bytes(&self) -> [u8; 32] {
                let digits = &self.0[2..];
                let padded = format!("{digits:0>width$}", width = MAX_HEX_DIGITS);
                let mut out = [0u8; 32];
                // Digits were validated on construction.
                if let Ok(decoded) = hex::decode(padded) {
                    out.copy_from_slice(&decoded);
                }
                out
            }

            /// Canonical string form (`0x…`, lowercase, no leading zeros).
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First `len` characters of the canonical form, prefix included.
            pub fn prefix(&self, len: usize) -> &str {
                &self.0[..len.min(self.0.len())]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

ledger_id!(
    /// Account address (wallet identity, whitelist member).
    Address
);

ledger_id!(
    /// Ledger object identifier (assets, capability objects, collections).
    ObjectId
);

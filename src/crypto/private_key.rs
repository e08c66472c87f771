// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Private Key Material
//!
//! Handles the operator's beacon private keys: 28-byte big-endian P-224
//! scalars, carried on the wire either as 40-character base64 or as
//! 56-character hex.
//!
//! ## Security Considerations
//!
//! - Scalars are zeroized when dropped
//! - `Debug` output is redacted
//! - Keys are NEVER logged; only counts of loaded/rejected keys are
//!
//! ## Usage
//!
//! ```
//! use beacon_report_node::crypto::{parse_key_list, parse_private_key};
//!
//! let key = parse_private_key("0123456789abcdef0123456789abcdef0123456789abcdef01234567")?;
//! assert_eq!(key.as_bytes().len(), 28);
//!
//! let parsed = parse_key_list("not-a-key,\n0123456789abcdef0123456789abcdef0123456789abcdef01234567");
//! assert_eq!(parsed.valid.len(), 1);
//! assert_eq!(parsed.invalid, vec!["not-a-key".to_string()]);
//! # Ok::<(), beacon_report_node::crypto::CryptoError>(())
//! ```

use super::error::CryptoError;
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use std::env;
use std::fmt;
use std::sync::OnceLock;
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a P-224 private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 28;

/// Length of a base64-encoded private key
pub const PRIVATE_KEY_BASE64_LEN: usize = 40;

/// Length of a hex-encoded private key
pub const PRIVATE_KEY_HEX_LEN: usize = 56;

/// Environment variable holding a comma-separated private key list
pub const PRIVATE_KEYS_ENV: &str = "BEACON_PRIVATE_KEYS";

/// A 28-byte big-endian private scalar on secp224r1
///
/// Only the length is checked on construction; whether the value is a
/// usable scalar (non-zero, below the curve order) is decided when the key
/// is first used.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct PrivateScalar([u8; PRIVATE_KEY_SIZE]);

impl PrivateScalar {
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a scalar from a slice that must be exactly 28 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; PRIVATE_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::invalid_private_key(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.0
    }

    /// Base64 form used by key files and the key store
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Interpret the scalar as a P-224 secret key
    ///
    /// Fails with `InvalidKey` when the scalar is zero or not below the
    /// curve order.
    pub fn secret_key(&self) -> Result<p224::SecretKey, CryptoError> {
        p224::SecretKey::from_bytes(p224::FieldBytes::from_slice(&self.0)).map_err(|_| {
            CryptoError::invalid_private_key("scalar is zero or not below the P-224 order")
        })
    }
}

impl fmt::Debug for PrivateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateScalar(<redacted>)")
    }
}

impl From<p224::SecretKey> for PrivateScalar {
    fn from(secret: p224::SecretKey) -> Self {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        bytes.copy_from_slice(&secret.to_bytes());
        Self(bytes)
    }
}

fn base64_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[-A-Za-z0-9+/]*={0,3}$").expect("static regex"))
}

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Fa-f0-9]*$").expect("static regex"))
}

/// Normalize user-supplied key text
///
/// Strips surrounding whitespace and embedded spaces, then accepts only
/// base64 strings of 40 (private key) or 44 (lookup identifier) characters
/// and hex strings of 56 or 64 characters. Returns `None` for anything else.
pub fn sanitize_key_input(input: &str) -> Option<String> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ' ').collect();

    match cleaned.len() {
        40 | 44 if base64_pattern().is_match(&cleaned) => Some(cleaned),
        56 | 64 if hex_pattern().is_match(&cleaned) => Some(cleaned),
        _ => None,
    }
}

/// Parse one private key given as 40-char base64 or 56-char hex
pub fn parse_private_key(input: &str) -> Result<PrivateScalar, CryptoError> {
    let cleaned = sanitize_key_input(input)
        .ok_or_else(|| CryptoError::invalid_private_key("not 40-char base64 or 56-char hex"))?;

    let bytes = match cleaned.len() {
        PRIVATE_KEY_BASE64_LEN => STANDARD
            .decode(&cleaned)
            .map_err(|e| CryptoError::invalid_private_key(format!("base64 decode error: {}", e)))?,
        PRIVATE_KEY_HEX_LEN => hex::decode(&cleaned)
            .map_err(|e| CryptoError::invalid_private_key(format!("hex decode error: {}", e)))?,
        other => {
            return Err(CryptoError::invalid_private_key(format!(
                "length {} is reserved for lookup identifiers",
                other
            )))
        }
    };

    PrivateScalar::from_slice(&bytes)
}

/// Result of parsing a list of private keys
#[derive(Debug, Default, Clone)]
pub struct ParsedKeys {
    /// Keys that decoded to exactly 28 bytes, in input order, without duplicates
    pub valid: Vec<PrivateScalar>,
    /// Raw entries that were rejected
    pub invalid: Vec<String>,
}

/// Parse a comma- or newline-separated list of private keys
///
/// Empty entries are skipped. Invalid entries are collected rather than
/// failing the whole list.
pub fn parse_key_list(input: &str) -> ParsedKeys {
    let mut parsed = ParsedKeys::default();

    for entry in input.split([',', '\n']) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        match parse_private_key(entry) {
            Ok(key) => {
                if !parsed.valid.contains(&key) {
                    parsed.valid.push(key);
                }
            }
            Err(_) => parsed.invalid.push(entry.to_string()),
        }
    }

    parsed
}

/// Load private keys from the `BEACON_PRIVATE_KEYS` environment variable
///
/// # Security
///
/// The key values are NEVER logged, only how many were accepted.
pub fn extract_private_keys_from_env() -> Result<ParsedKeys> {
    let raw = env::var(PRIVATE_KEYS_ENV)
        .map_err(|_| anyhow!("{} environment variable not set", PRIVATE_KEYS_ENV))?;

    if raw.trim().is_empty() {
        return Err(anyhow!("{} is empty", PRIVATE_KEYS_ENV));
    }

    let parsed = parse_key_list(&raw);
    if !parsed.invalid.is_empty() {
        warn!(
            "⚠️ {} entries in {} were rejected",
            parsed.invalid.len(),
            PRIVATE_KEYS_ENV
        );
    }
    info!("✅ Loaded {} private key(s) from environment", parsed.valid.len());

    Ok(parsed)
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lookup Identifier Derivation
//!
//! A beacon advertises the x-coordinate of its P-224 public key. The
//! location network indexes reports by the SHA-256 of that coordinate, so
//! the operator can request reports without revealing anything about the
//! private key:
//!
//! ```text
//! public     = scalar · G
//! adv_key    = x(public)            (28 bytes, big-endian)
//! identifier = SHA-256(adv_key)     (32 bytes, base64 on the wire)
//! ```

use super::error::CryptoError;
use super::private_key::PrivateScalar;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use p224::elliptic_curve::sec1::ToEncodedPoint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Size of a lookup identifier (SHA-256 digest)
pub const LOOKUP_IDENTIFIER_SIZE: usize = 32;

/// Size of an advertisement key (P-224 x-coordinate)
pub const ADVERTISEMENT_KEY_SIZE: usize = 28;

/// Public, network-visible hash used to request a device's reports
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupIdentifier([u8; LOOKUP_IDENTIFIER_SIZE]);

impl LookupIdentifier {
    pub fn from_bytes(bytes: [u8; LOOKUP_IDENTIFIER_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; LOOKUP_IDENTIFIER_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// First seven characters of the base64 form, used as a display label
    pub fn short(&self) -> String {
        self.to_base64().chars().take(7).collect()
    }
}

impl fmt::Display for LookupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for LookupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LookupIdentifier({})", self.to_base64())
    }
}

impl FromStr for LookupIdentifier {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| CryptoError::InvalidKey {
            key_type: "lookup_identifier".to_string(),
            reason,
        };

        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| invalid(format!("base64 decode error: {}", e)))?;
        let array: [u8; LOOKUP_IDENTIFIER_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            invalid(format!(
                "expected {} bytes, got {}",
                LOOKUP_IDENTIFIER_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for LookupIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for LookupIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// The 28-byte x-coordinate a beacon broadcasts as its public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdvertisementKey([u8; ADVERTISEMENT_KEY_SIZE]);

impl AdvertisementKey {
    pub fn as_bytes(&self) -> &[u8; ADVERTISEMENT_KEY_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Lookup identifier of the device advertising this key
    pub fn lookup_identifier(&self) -> LookupIdentifier {
        LookupIdentifier(Sha256::digest(self.0).into())
    }
}

impl fmt::Debug for AdvertisementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdvertisementKey({})", self.to_base64())
    }
}

impl fmt::Display for AdvertisementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// Derive the advertisement key (public x-coordinate) for a private scalar
///
/// Fails with `InvalidKey` when the scalar is zero or not below the curve
/// order.
pub fn derive_advertisement_key(scalar: &PrivateScalar) -> Result<AdvertisementKey, CryptoError> {
    let public = scalar.secret_key()?.public_key();
    let encoded = public.to_encoded_point(false);
    let x = encoded
        .x()
        .ok_or_else(|| CryptoError::invalid_private_key("public key is the identity point"))?;

    let mut bytes = [0u8; ADVERTISEMENT_KEY_SIZE];
    bytes.copy_from_slice(x);
    Ok(AdvertisementKey(bytes))
}

/// Derive the lookup identifier for a private scalar
///
/// # Example
///
/// ```
/// use beacon_report_node::crypto::{derive_lookup_identifier, parse_private_key};
///
/// let key = parse_private_key("0123456789abcdef0123456789abcdef0123456789abcdef01234567")?;
/// let id = derive_lookup_identifier(&key)?;
/// assert_eq!(id.to_base64().len(), 44);
/// # Ok::<(), beacon_report_node::crypto::CryptoError>(())
/// ```
pub fn derive_lookup_identifier(scalar: &PrivateScalar) -> Result<LookupIdentifier, CryptoError> {
    Ok(derive_advertisement_key(scalar)?.lookup_identifier())
}

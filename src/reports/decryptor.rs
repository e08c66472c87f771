// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report decryption
//!
//! Opens a parsed envelope with the beacon's private scalar and decodes the
//! 10-byte plaintext:
//!
//! ```text
//! lat i32 BE (1e-7 deg) | lon i32 BE (1e-7 deg) | accuracy u8 | status u8
//! ```

use super::envelope::{parse_envelope, ReportEnvelope, CIPHERTEXT_SIZE};
use crate::crypto::{decrypt_aes_gcm, derive_shared_key, CryptoError, PrivateScalar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-point scale of the encoded coordinates
pub const COORDINATE_SCALE: f64 = 10_000_000.0;

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A single decrypted location observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptedFix {
    /// Unix epoch seconds
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: u16,
    pub horizontal_accuracy: u8,
    pub status: u8,
}

impl DecryptedFix {
    /// Observation time as a UTC datetime
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
    }

    /// Encode the plaintext part of the fix (coordinates, accuracy, status)
    ///
    /// # Errors
    ///
    /// `InvalidFix` if a coordinate is not finite or lies outside ±90 / ±180
    /// degrees.
    pub fn plaintext(&self) -> Result<[u8; CIPHERTEXT_SIZE], CryptoError> {
        let lat = encode_coordinate("latitude", self.latitude, MAX_LATITUDE)?;
        let lon = encode_coordinate("longitude", self.longitude, MAX_LONGITUDE)?;

        let mut out = [0u8; CIPHERTEXT_SIZE];
        out[0..4].copy_from_slice(&lat.to_be_bytes());
        out[4..8].copy_from_slice(&lon.to_be_bytes());
        out[8] = self.horizontal_accuracy;
        out[9] = self.status;
        Ok(out)
    }
}

fn encode_coordinate(field: &'static str, degrees: f64, limit: f64) -> Result<i32, CryptoError> {
    if !degrees.is_finite() || degrees.abs() > limit {
        return Err(CryptoError::InvalidFix {
            field,
            reason: format!("{} is outside ±{} degrees", degrees, limit),
        });
    }
    // |degrees| <= 180 keeps the scaled value well inside i32
    Ok((degrees * COORDINATE_SCALE).round() as i32)
}

/// Decrypt a parsed envelope with the beacon's private scalar
///
/// All fields are produced together; any failure yields no partial fix.
///
/// # Errors
///
/// - `InvalidEphemeralKey` if the envelope's ephemeral key is not a P-224 point
/// - `InvalidScalar` if the scalar cannot be used for key agreement
/// - `AuthenticationFailed` if the tag does not verify
pub fn decrypt_report(
    envelope: &ReportEnvelope,
    scalar: &PrivateScalar,
) -> Result<DecryptedFix, CryptoError> {
    let keys = derive_shared_key(&envelope.ephemeral_key, scalar)?;
    let plaintext = decrypt_aes_gcm(&keys, &envelope.ciphertext, &envelope.tag)?;

    let lat = i32::from_be_bytes([plaintext[0], plaintext[1], plaintext[2], plaintext[3]]);
    let lon = i32::from_be_bytes([plaintext[4], plaintext[5], plaintext[6], plaintext[7]]);

    Ok(DecryptedFix {
        timestamp: envelope.timestamp,
        latitude: f64::from(lat) / COORDINATE_SCALE,
        longitude: f64::from(lon) / COORDINATE_SCALE,
        confidence: envelope.confidence,
        horizontal_accuracy: plaintext[8],
        status: plaintext[9],
    })
}

/// Parse and decrypt a raw report payload in one step
pub fn decrypt_payload(raw: &[u8], scalar: &PrivateScalar) -> Result<DecryptedFix, CryptoError> {
    let envelope = parse_envelope(raw)?;
    decrypt_report(&envelope, scalar)
}

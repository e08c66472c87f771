// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Exchange Implementation
//!
//! Implements Elliptic Curve Diffie-Hellman key exchange on secp224r1
//! (P-224). Every report carries a one-time ephemeral public key generated
//! by the finder device; combining it with the beacon's static private key
//! yields the per-report AES key and IV.

use super::error::CryptoError;
use super::private_key::PrivateScalar;
use p224::{ecdh::diffie_hellman, PublicKey};
use sha2::{Digest, Sha256};

/// Size of an uncompressed SEC1 P-224 point (0x04 ∥ x ∥ y)
pub const EPHEMERAL_KEY_SIZE: usize = 57;

/// Counter appended to the shared secret before hashing
const KDF_COUNTER: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Symmetric material for a single report
#[derive(Clone, PartialEq, Eq)]
pub struct ReportKeys {
    /// AES-128 key (first half of the KDF digest)
    pub key: [u8; 16],
    /// GCM initialization vector (second half of the KDF digest)
    pub iv: [u8; 16],
}

impl std::fmt::Debug for ReportKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReportKeys(<redacted>)")
    }
}

/// Parse an ephemeral public key from its uncompressed SEC1 encoding
pub fn parse_ephemeral_key(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    if bytes.len() != EPHEMERAL_KEY_SIZE || bytes[0] != 0x04 {
        return Err(CryptoError::InvalidEphemeralKey(format!(
            "expected {}-byte uncompressed point, got {} bytes",
            EPHEMERAL_KEY_SIZE,
            bytes.len()
        )));
    }

    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| CryptoError::InvalidEphemeralKey("point is not on P-224".to_string()))
}

/// Derive the per-report key material from raw ECDH output
///
/// `SHA-256(shared_secret ∥ 00000001 ∥ ephemeral_key)`, split into the
/// AES key (bytes 0..16) and IV (bytes 16..32).
pub fn derive_report_keys(shared_secret: &[u8], ephemeral_key: &[u8]) -> ReportKeys {
    let digest = Sha256::new()
        .chain_update(shared_secret)
        .chain_update(KDF_COUNTER)
        .chain_update(ephemeral_key)
        .finalize();

    let mut key = [0u8; 16];
    let mut iv = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    iv.copy_from_slice(&digest[16..]);
    ReportKeys { key, iv }
}

/// Derive a report's symmetric keys using ECDH
///
/// Performs ECDH between the report's ephemeral public key and the
/// beacon's private scalar, then runs the report KDF over the raw shared
/// x-coordinate.
///
/// # Arguments
///
/// * `ephemeral_key` - Finder's ephemeral public key (57 bytes uncompressed)
/// * `scalar` - Beacon's static private scalar
///
/// # Errors
///
/// - `InvalidEphemeralKey` if the point encoding is malformed or off-curve
/// - `InvalidScalar` if the scalar is zero or not below the curve order
pub fn derive_shared_key(
    ephemeral_key: &[u8],
    scalar: &PrivateScalar,
) -> Result<ReportKeys, CryptoError> {
    let peer = parse_ephemeral_key(ephemeral_key)?;

    let secret = scalar
        .secret_key()
        .map_err(|_| CryptoError::InvalidScalar("not a valid P-224 scalar".to_string()))?;

    // shared_point = ephemeral_pub * scalar
    let shared = diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());

    Ok(derive_report_keys(
        shared.raw_secret_bytes().as_slice(),
        ephemeral_key,
    ))
}

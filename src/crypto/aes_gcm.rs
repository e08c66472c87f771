// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-GCM for Location Reports
//!
//! Reports are sealed with AES-128-GCM using a **16-byte** IV taken from the
//! report KDF, rather than the usual 12-byte nonce. GCM handles this by
//! hashing the IV into the initial counter block; the `aes-gcm` crate
//! supports it through its nonce-size type parameter.
//!
//! **Report Format**:
//! ```text
//! [ciphertext (10 bytes) | tag (16 bytes)]   (stored detached in the envelope)
//! ```
//!
//! - Key: 16 bytes, IV: 16 bytes, Tag: 16 bytes
//! - No Additional Authenticated Data (AAD)

use super::ecdh::ReportKeys;
use super::error::CryptoError;
use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes128,
    AesGcm, Key, Nonce, Tag,
};

/// AES-128-GCM with a 128-bit nonce
type ReportCipher = AesGcm<Aes128, U16>;

/// Size of the GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Decrypt a report ciphertext and verify its detached tag
///
/// # Errors
///
/// Returns `AuthenticationFailed` if the tag does not verify. No plaintext
/// is returned in that case.
///
/// # Example
///
/// ```rust,ignore
/// let keys = derive_shared_key(&envelope.ephemeral_key, &scalar)?;
/// let plaintext = decrypt_aes_gcm(&keys, &envelope.ciphertext, &envelope.tag)?;
/// ```
pub fn decrypt_aes_gcm(
    keys: &ReportKeys,
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ReportCipher::new(Key::<ReportCipher>::from_slice(&keys.key));
    let nonce = Nonce::<U16>::from_slice(&keys.iv);

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(nonce, b"", &mut buffer, Tag::from_slice(tag))
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    Ok(buffer)
}

/// Encrypt a plaintext, returning the ciphertext and the detached tag
///
/// # Errors
///
/// Returns `EncryptionFailed` if the cipher rejects the input; no tag is
/// produced in that case.
pub fn encrypt_aes_gcm(
    keys: &ReportKeys,
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_SIZE]), CryptoError> {
    let cipher = ReportCipher::new(Key::<ReportCipher>::from_slice(&keys.key));
    let nonce = Nonce::<U16>::from_slice(&keys.iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, b"", &mut buffer)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((buffer, tag.into()))
}

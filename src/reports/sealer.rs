// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report sealing (the finder side of the protocol)
//!
//! Produces raw reports exactly as a finder device would upload them. Used
//! to build fixtures and by `beacon-cli seal`.

use super::decryptor::DecryptedFix;
use super::envelope::{encode_timestamp, EnvelopeLayout, ReportEnvelope, CIPHERTEXT_SIZE};
use crate::crypto::ecdh::{derive_report_keys, EPHEMERAL_KEY_SIZE};
use crate::crypto::{encrypt_aes_gcm, CryptoError};
use p224::elliptic_curve::sec1::ToEncodedPoint;
use p224::{ecdh::diffie_hellman, PublicKey, SecretKey};

/// Encrypt a fix to a beacon's public key
///
/// `fix.timestamp` is Unix seconds. In the compact layout only the low
/// byte of `fix.confidence` is kept.
///
/// # Errors
///
/// `InvalidFix` if the timestamp predates 2001-01-01 or overflows the 32-bit
/// counter, or a coordinate is out of range. Nothing is encrypted then.
pub fn seal_report(
    fix: &DecryptedFix,
    recipient: &PublicKey,
    ephemeral: &SecretKey,
    layout: EnvelopeLayout,
) -> Result<Vec<u8>, CryptoError> {
    encode_timestamp(fix.timestamp)?;
    let plaintext = fix.plaintext()?;

    let eph_point = ephemeral.public_key().to_encoded_point(false);
    let mut ephemeral_key = [0u8; EPHEMERAL_KEY_SIZE];
    ephemeral_key.copy_from_slice(eph_point.as_bytes());

    let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), recipient.as_affine());
    let keys = derive_report_keys(shared.raw_secret_bytes().as_slice(), &ephemeral_key);

    let (ct, tag) = encrypt_aes_gcm(&keys, &plaintext)?;
    let mut ciphertext = [0u8; CIPHERTEXT_SIZE];
    ciphertext.copy_from_slice(&ct);

    let confidence = match layout {
        EnvelopeLayout::Compact => fix.confidence & 0x00FF,
        EnvelopeLayout::Extended => fix.confidence,
    };

    ReportEnvelope {
        layout,
        timestamp: fix.timestamp,
        confidence,
        ephemeral_key,
        ciphertext,
        tag,
    }
    .to_bytes()
}

/// Encrypt a fix with a freshly generated ephemeral key
pub fn seal_report_random(
    fix: &DecryptedFix,
    recipient: &PublicKey,
    layout: EnvelopeLayout,
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = SecretKey::random(&mut rand::rngs::OsRng);
    seal_report(fix, recipient, &ephemeral, layout)
}

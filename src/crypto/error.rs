// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Typed failures for key handling and report decryption. Every variant is
//! scoped to a single key or a single report, so callers can accumulate them
//! next to successful results instead of aborting a batch.
//!
//! ## Error Variants
//!
//! - **InvalidKey**: Key material is malformed or not a valid P-224 scalar
//! - **InvalidPayloadLength**: Report payload is not 88 or 89 bytes
//! - **InvalidPayloadEncoding**: Report payload is not valid base64
//! - **InvalidEphemeralKey**: Ephemeral key is not a point on P-224
//! - **AuthenticationFailed**: AES-GCM tag verification failed
//! - **InvalidScalar**: Scalar rejected as a key agreement input
//! - **AmbiguousIdentifier**: Two distinct keys share one lookup identifier
//! - **InvalidFix**: A fix field does not fit the report wire format
//! - **EncryptionFailed**: AES-GCM refused to seal a plaintext
//!
//! ## Usage Example
//!
//! ```rust
//! use beacon_report_node::crypto::CryptoError;
//!
//! let err = CryptoError::InvalidPayloadLength { actual: 50 };
//! assert_eq!(
//!     err.to_string(),
//!     "Invalid payload length: expected 88 or 89 bytes, got 50"
//! );
//! ```

use thiserror::Error;

/// Error type for key handling and per-report cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material could not be decoded, or is zero / not below the curve order
    #[error("Invalid key ({key_type}): {reason}")]
    InvalidKey {
        /// Which key failed (e.g., "private_key", "lookup_identifier")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Report payload length selects no known envelope layout
    #[error("Invalid payload length: expected 88 or 89 bytes, got {actual}")]
    InvalidPayloadLength { actual: usize },

    /// Report payload is not valid base64
    #[error("Invalid payload encoding: {0}")]
    InvalidPayloadEncoding(String),

    /// Ephemeral public key is not a valid uncompressed P-224 point
    #[error("Invalid ephemeral key: {0}")]
    InvalidEphemeralKey(String),

    /// AES-GCM authentication tag did not verify (wrong key or tampered report)
    #[error("Authentication failed: report tag did not verify")]
    AuthenticationFailed,

    /// Private scalar was rejected as a key agreement input
    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    /// A second, distinct key produced an identifier already held by another key
    #[error("Ambiguous identifier {identifier}: displaced by a later key")]
    AmbiguousIdentifier { identifier: String },

    /// A fix field cannot be encoded without loss
    #[error("Invalid fix ({field}): {reason}")]
    InvalidFix {
        field: &'static str,
        reason: String,
    },

    /// AES-GCM encryption failed; no report is produced
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

impl CryptoError {
    pub(crate) fn invalid_private_key(reason: impl Into<String>) -> Self {
        CryptoError::InvalidKey {
            key_type: "private_key".to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable label, used in logs and serialized output
    pub fn kind(&self) -> &'static str {
        match self {
            CryptoError::InvalidKey { .. } => "invalid_key",
            CryptoError::InvalidPayloadLength { .. } => "invalid_payload_length",
            CryptoError::InvalidPayloadEncoding(_) => "invalid_payload_encoding",
            CryptoError::InvalidEphemeralKey(_) => "invalid_ephemeral_key",
            CryptoError::AuthenticationFailed => "authentication_failed",
            CryptoError::InvalidScalar(_) => "invalid_scalar",
            CryptoError::AmbiguousIdentifier { .. } => "ambiguous_identifier",
            CryptoError::InvalidFix { .. } => "invalid_fix",
            CryptoError::EncryptionFailed(_) => "encryption_failed",
        }
    }
}

// Conversion from base64 decode errors (report payloads)
impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::InvalidPayloadEncoding(err.to_string())
    }
}

// Conversion from p224 errors (elliptic curve operations)
impl From<p224::elliptic_curve::Error> for CryptoError {
    fn from(err: p224::elliptic_curve::Error) -> Self {
        CryptoError::InvalidEphemeralKey(format!("p224 error: {}", err))
    }
}

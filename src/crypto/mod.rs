// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report Cryptography Module
//!
//! This module implements the cryptographic primitives needed to open
//! crowdsourced location reports addressed to the operator's beacons:
//!
//! - **Private keys**: 28-byte P-224 scalars, parsed from base64 or hex
//! - **Identifier**: SHA-256 of the advertised x-coordinate, used to query reports
//! - **ECDH**: Ephemeral-static key agreement on secp224r1
//! - **AES-GCM**: AES-128-GCM with a 16-byte IV and detached tag
//!
//! ## Security Considerations
//!
//! - Private scalars are held in memory only and zeroized on drop
//! - Private scalars are never logged; identifiers are public and may be
//! - A failed tag check never yields plaintext
//!
//! ## Protocol Flow
//!
//! 1. Beacon advertises `x(scalar · G)`; finders encrypt a fix to that key
//! 2. Finder generates an ephemeral keypair and performs ECDH with the beacon key
//! 3. Finder derives `SHA-256(shared ∥ 00000001 ∥ eph_pub)` → AES key ∥ IV
//! 4. Finder uploads `timestamp ∥ confidence ∥ eph_pub ∥ ciphertext ∥ tag`
//! 5. Operator queries by identifier, repeats the ECDH with the private scalar
//!    and decrypts

pub mod aes_gcm;
pub mod ecdh;
pub mod error;
pub mod identifier;
pub mod private_key;

pub use aes_gcm::{decrypt_aes_gcm, encrypt_aes_gcm};
pub use ecdh::{derive_shared_key, ReportKeys};
pub use error::CryptoError;
pub use identifier::{
    derive_advertisement_key, derive_lookup_identifier, AdvertisementKey, LookupIdentifier,
};
pub use private_key::{
    extract_private_keys_from_env, parse_key_list, parse_private_key, sanitize_key_input,
    ParsedKeys, PrivateScalar, PRIVATE_KEYS_ENV,
};

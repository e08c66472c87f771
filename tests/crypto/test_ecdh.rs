// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for report key agreement and KDF

use beacon_report_node::crypto::ecdh::{derive_report_keys, parse_ephemeral_key, EPHEMERAL_KEY_SIZE};
use beacon_report_node::crypto::{derive_shared_key, CryptoError, PrivateScalar};
use p224::ecdh::diffie_hellman;
use p224::elliptic_curve::sec1::ToEncodedPoint;
use p224::SecretKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

fn ephemeral_bytes(secret: &SecretKey) -> Vec<u8> {
    secret.public_key().to_encoded_point(false).as_bytes().to_vec()
}

#[test]
fn test_beacon_and_finder_derive_same_keys() {
    let beacon = SecretKey::random(&mut OsRng);
    let ephemeral = SecretKey::random(&mut OsRng);
    let eph = ephemeral_bytes(&ephemeral);
    assert_eq!(eph.len(), EPHEMERAL_KEY_SIZE);

    // Finder side
    let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), beacon.public_key().as_affine());
    let finder = derive_report_keys(shared.raw_secret_bytes().as_slice(), &eph);

    // Beacon side
    let keys = derive_shared_key(&eph, &PrivateScalar::from(beacon)).unwrap();

    assert_eq!(keys.key, finder.key);
    assert_eq!(keys.iv, finder.iv);
}

#[test]
fn test_kdf_layout() {
    let shared = [0x11u8; 28];
    let eph = [0x04u8; 57];

    let mut hasher = Sha256::new();
    hasher.update(shared);
    hasher.update([0, 0, 0, 1]);
    hasher.update(eph);
    let digest = hasher.finalize();

    let keys = derive_report_keys(&shared, &eph);
    assert_eq!(&keys.key[..], &digest[..16]);
    assert_eq!(&keys.iv[..], &digest[16..]);
}

#[test]
fn test_compressed_point_rejected() {
    let ephemeral = SecretKey::random(&mut OsRng);
    let compressed = ephemeral.public_key().to_encoded_point(true);
    assert!(matches!(
        parse_ephemeral_key(compressed.as_bytes()),
        Err(CryptoError::InvalidEphemeralKey(_))
    ));
}

#[test]
fn test_off_curve_point_rejected() {
    let mut bogus = [0x01u8; 57];
    bogus[0] = 0x04;
    let scalar = PrivateScalar::from(SecretKey::random(&mut OsRng));
    assert!(matches!(
        derive_shared_key(&bogus, &scalar),
        Err(CryptoError::InvalidEphemeralKey(_))
    ));
}

#[test]
fn test_invalid_scalar_reported() {
    let ephemeral = SecretKey::random(&mut OsRng);
    let eph = ephemeral_bytes(&ephemeral);
    let zero = PrivateScalar::from_bytes([0u8; 28]);
    assert!(matches!(
        derive_shared_key(&eph, &zero),
        Err(CryptoError::InvalidScalar(_))
    ));
}

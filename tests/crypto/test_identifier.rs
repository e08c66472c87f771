// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for advertisement key and lookup identifier derivation

use base64::{engine::general_purpose::STANDARD, Engine as _};
use beacon_report_node::crypto::{
    derive_advertisement_key, derive_lookup_identifier, CryptoError, LookupIdentifier,
    PrivateScalar,
};
use p224::elliptic_curve::sec1::ToEncodedPoint;
use p224::SecretKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

#[test]
fn test_identifier_is_sha256_of_x_coordinate() {
    let secret = SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    let x = point.x().unwrap();

    let scalar = PrivateScalar::from(secret);
    let id = derive_lookup_identifier(&scalar).unwrap();

    let expected: [u8; 32] = Sha256::digest(x).into();
    assert_eq!(id.as_bytes(), &expected);
    assert_eq!(id.to_base64(), STANDARD.encode(expected));
}

#[test]
fn test_text_lengths() {
    let scalar = PrivateScalar::from(SecretKey::random(&mut OsRng));

    let adv = derive_advertisement_key(&scalar).unwrap();
    assert_eq!(adv.to_base64().len(), 40);

    let id = derive_lookup_identifier(&scalar).unwrap();
    assert_eq!(id.to_base64().len(), 44);
    assert_eq!(adv.lookup_identifier(), id);
}

#[test]
fn test_derivation_is_deterministic() {
    let scalar = PrivateScalar::from(SecretKey::random(&mut OsRng));
    assert_eq!(
        derive_lookup_identifier(&scalar).unwrap(),
        derive_lookup_identifier(&scalar.clone()).unwrap()
    );
}

#[test]
fn test_distinct_keys_give_distinct_identifiers() {
    let a = PrivateScalar::from(SecretKey::random(&mut OsRng));
    let b = PrivateScalar::from(SecretKey::random(&mut OsRng));
    assert_ne!(
        derive_lookup_identifier(&a).unwrap(),
        derive_lookup_identifier(&b).unwrap()
    );
}

#[test]
fn test_zero_scalar_rejected() {
    let zero = PrivateScalar::from_bytes([0u8; 28]);
    assert!(matches!(
        derive_lookup_identifier(&zero),
        Err(CryptoError::InvalidKey { .. })
    ));
}

#[test]
fn test_scalar_above_order_rejected() {
    let too_big = PrivateScalar::from_bytes([0xFF; 28]);
    assert!(derive_advertisement_key(&too_big).is_err());
}

#[test]
fn test_identifier_text_round_trip() {
    let scalar = PrivateScalar::from(SecretKey::random(&mut OsRng));
    let id = derive_lookup_identifier(&scalar).unwrap();

    let parsed: LookupIdentifier = id.to_base64().parse().unwrap();
    assert_eq!(parsed, id);
    assert!("dG9vIHNob3J0".parse::<LookupIdentifier>().is_err());
}

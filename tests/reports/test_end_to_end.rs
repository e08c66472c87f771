// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Seal, parse and decrypt a report the way a finder and the operator would

use base64::{engine::general_purpose::STANDARD, Engine as _};
use beacon_report_node::crypto::{
    derive_lookup_identifier, parse_private_key, CryptoError, LookupIdentifier, PrivateScalar,
};
use beacon_report_node::reports::{
    decrypt_payload, parse_envelope, seal_report, seal_report_random, CorrelationProcessor,
    DecryptedFix, EnvelopeLayout, KeyRegistry, ReportBatch,
};
use p224::SecretKey;
use rand::rngs::OsRng;

// Reference report produced by an independent P-224 / AES-GCM implementation
const KNOWN_SCALAR_HEX: &str = "0123456789abcdef0123456789abcdef0123456789abcdef01234567";
const KNOWN_IDENTIFIER: &str = "Z5RQ5YidmEpGxbRobiSLhC+pj/9oqNE+C7B5cDkVr0I=";
const KNOWN_PAYLOAD: &str = "ZVPxAAIE8inZn20Bh8o+VmlLy9D3mu3iwuFDc0sGdmmkhwaOg/AW7AB8ISBmjngabT7MeoAxIEUdTERXNigCP81HOuJrZ8dCEJivqD0jam0esug/QrckjQ==";

fn reference_fix() -> DecryptedFix {
    DecryptedFix {
        timestamp: 1_700_000_000 + 978_307_200,
        latitude: 37.7749,
        longitude: -122.4194,
        confidence: 2,
        horizontal_accuracy: 5,
        status: 0,
    }
}

#[test]
fn test_compact_report_decrypts() {
    let beacon = SecretKey::random(&mut OsRng);
    let ephemeral = SecretKey::random(&mut OsRng);

    let raw = seal_report(
        &reference_fix(),
        &beacon.public_key(),
        &ephemeral,
        EnvelopeLayout::Compact,
    ).unwrap();
    assert_eq!(raw.len(), 88);

    let fix = decrypt_payload(&raw, &PrivateScalar::from(beacon)).unwrap();
    assert_eq!(fix.timestamp, 2_678_307_200);
    assert!((fix.latitude - 37.7749).abs() < 1e-7);
    assert!((fix.longitude + 122.4194).abs() < 1e-7);
    assert_eq!(fix.confidence, 2);
    assert_eq!(fix.horizontal_accuracy, 5);
    assert_eq!(fix.status, 0);
}

#[test]
fn test_extended_report_keeps_two_byte_confidence() {
    let beacon = SecretKey::random(&mut OsRng);
    let fix = DecryptedFix {
        confidence: 0x0203,
        ..reference_fix()
    };

    let raw = seal_report_random(&fix, &beacon.public_key(), EnvelopeLayout::Extended).unwrap();
    assert_eq!(raw.len(), 89);

    let decrypted = decrypt_payload(&raw, &PrivateScalar::from(beacon)).unwrap();
    assert_eq!(decrypted.confidence, 0x0203);
    assert_eq!(decrypted.status, 0);
}

#[test]
fn test_negative_coordinates_sign_extended() {
    let beacon = SecretKey::random(&mut OsRng);
    let fix = DecryptedFix {
        latitude: -33.8688,
        longitude: -70.6693,
        ..reference_fix()
    };

    let raw = seal_report_random(&fix, &beacon.public_key(), EnvelopeLayout::Compact).unwrap();
    let decrypted = decrypt_payload(&raw, &PrivateScalar::from(beacon)).unwrap();
    assert!((decrypted.latitude + 33.8688).abs() < 1e-7);
    assert!((decrypted.longitude + 70.6693).abs() < 1e-7);
}

#[test]
fn test_wrong_key_fails_authentication() {
    let beacon = SecretKey::random(&mut OsRng);
    let stranger = PrivateScalar::from(SecretKey::random(&mut OsRng));

    let raw = seal_report_random(&reference_fix(), &beacon.public_key(), EnvelopeLayout::Compact).unwrap();
    assert_eq!(
        decrypt_payload(&raw, &stranger),
        Err(CryptoError::AuthenticationFailed)
    );
}

#[test]
fn test_any_tag_bit_flip_fails() {
    let beacon = SecretKey::random(&mut OsRng);
    let scalar = PrivateScalar::from(beacon.clone());
    let raw = seal_report_random(&reference_fix(), &beacon.public_key(), EnvelopeLayout::Compact).unwrap();
    let tag_start = 72;

    for bit in 0..128 {
        let mut tampered = raw.clone();
        tampered[tag_start + bit / 8] ^= 1 << (bit % 8);
        assert_eq!(
            decrypt_payload(&tampered, &scalar),
            Err(CryptoError::AuthenticationFailed),
            "tag bit {} flip was accepted",
            bit
        );
    }
}

#[test]
fn test_parse_then_decrypt_matches_one_step() {
    let beacon = SecretKey::random(&mut OsRng);
    let scalar = PrivateScalar::from(beacon.clone());
    let raw = seal_report_random(&reference_fix(), &beacon.public_key(), EnvelopeLayout::Extended).unwrap();

    let envelope = parse_envelope(&raw).unwrap();
    let two_step = beacon_report_node::reports::decrypt_report(&envelope, &scalar).unwrap();
    assert_eq!(two_step, decrypt_payload(&raw, &scalar).unwrap());
}

fn assert_reference_fix(fix: &DecryptedFix) {
    assert_eq!(fix.timestamp, 2_678_307_200);
    assert!((fix.latitude - 37.7749).abs() < 1e-7);
    assert!((fix.longitude + 122.4194).abs() < 1e-7);
    assert_eq!(fix.confidence, 2);
    assert_eq!(fix.horizontal_accuracy, 5);
    assert_eq!(fix.status, 0);
}

#[test]
fn test_known_answer_report_decrypts() {
    let scalar = parse_private_key(KNOWN_SCALAR_HEX).unwrap();
    assert_eq!(
        derive_lookup_identifier(&scalar).unwrap().to_base64(),
        KNOWN_IDENTIFIER
    );

    let raw = STANDARD.decode(KNOWN_PAYLOAD).unwrap();
    assert_eq!(raw.len(), 88);
    assert_reference_fix(&decrypt_payload(&raw, &scalar).unwrap());
}

#[test]
fn test_known_answer_report_through_batch() {
    let scalar = parse_private_key(KNOWN_SCALAR_HEX).unwrap();
    let json = format!(
        r#"{{"statusCode":"200","results":[
            {{"id":"{id}","payload":"{payload}","datePublished":1700000000000}},
            {{"id":"short==","payload":"{payload}","datePublished":1700000000001}}]}}"#,
        id = KNOWN_IDENTIFIER,
        payload = KNOWN_PAYLOAD
    );

    let grouped = ReportBatch::from_json(&json).unwrap().into_groups().unwrap();
    assert_eq!(grouped.rejected.len(), 1);

    let (registry, _) = KeyRegistry::build(vec![scalar]);
    let result = CorrelationProcessor::default()
        .run(&grouped.groups, &registry)
        .unwrap();

    let id: LookupIdentifier = KNOWN_IDENTIFIER.parse().unwrap();
    let fixes = &result.decrypted[&id];
    assert_eq!(fixes.len(), 1);
    assert_reference_fix(&fixes[0]);
}

#[test]
fn test_seal_rejects_unencodable_fix() {
    let beacon = SecretKey::random(&mut OsRng);
    let before_epoch = DecryptedFix {
        timestamp: 1000,
        ..reference_fix()
    };
    let off_globe = DecryptedFix {
        latitude: 91.0,
        ..reference_fix()
    };

    for fix in [before_epoch, off_globe] {
        assert!(matches!(
            seal_report_random(&fix, &beacon.public_key(), EnvelopeLayout::Compact),
            Err(CryptoError::InvalidFix { .. })
        ));
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for batch correlation against a key registry

use beacon_report_node::crypto::{derive_lookup_identifier, CryptoError, LookupIdentifier, PrivateScalar};
use beacon_report_node::reports::{
    seal_report_random, CorrelationConfig, CorrelationError, CorrelationProcessor, DecryptedFix,
    EnvelopeLayout, KeyRegistry, RawReport, ReportBatch, UnmatchedPolicy, REPORT_EPOCH_OFFSET,
};
use p224::SecretKey;
use rand::rngs::OsRng;
use serde_json::json;

struct Beacon {
    secret: SecretKey,
    scalar: PrivateScalar,
    id: LookupIdentifier,
}

fn beacon() -> Beacon {
    let secret = SecretKey::random(&mut OsRng);
    let scalar = PrivateScalar::from(secret.clone());
    let id = derive_lookup_identifier(&scalar).unwrap();
    Beacon { secret, scalar, id }
}

fn fix(offset: i64) -> DecryptedFix {
    DecryptedFix {
        timestamp: REPORT_EPOCH_OFFSET + 600_000_000 + offset,
        latitude: 52.52,
        longitude: 13.405,
        confidence: 1,
        horizontal_accuracy: 30,
        status: 0,
    }
}

fn sealed(beacon: &Beacon, offset: i64) -> RawReport {
    let raw = seal_report_random(&fix(offset), &beacon.secret.public_key(), EnvelopeLayout::Compact).unwrap();
    RawReport::from_bytes(beacon.id, &raw, offset)
}

fn processor(policy: UnmatchedPolicy, parallel: bool) -> CorrelationProcessor {
    CorrelationProcessor::new(CorrelationConfig {
        unmatched_policy: policy,
        parallel,
    })
}

#[test]
fn test_partitions_are_disjoint() {
    let tracked = beacon();
    let untracked = beacon();

    let mut not_base64 = sealed(&tracked, 4);
    not_base64.payload = "%%%".to_string();

    let batch = ReportBatch::from_json(
        &json!({
            "statusCode": "200",
            "results": [
                sealed(&tracked, 1),
                RawReport::from_bytes(tracked.id, &[0u8; 88], 2),
                RawReport::from_bytes(tracked.id, &[0u8; 87], 3),
                not_base64,
                sealed(&tracked, 5),
                sealed(&untracked, 6),
            ]
        })
        .to_string(),
    )
    .unwrap();

    let grouped = batch.into_groups().unwrap();
    assert!(grouped.rejected.is_empty());
    let (registry, rejected) = KeyRegistry::build(vec![tracked.scalar.clone()]);
    assert!(rejected.is_empty());

    let result = processor(UnmatchedPolicy::Omit, true)
        .run(&grouped.groups, &registry)
        .unwrap();

    let fixes = &result.decrypted[&tracked.id];
    assert_eq!(fixes, &vec![fix(1), fix(5)]);
    assert!(!result.decrypted.contains_key(&untracked.id));
    assert!(result.unmatched.contains(&untracked.id));

    assert_eq!(result.malformed.len(), 3);
    let reasons: Vec<_> = result.malformed.iter().map(|m| m.reason.clone()).collect();
    assert!(reasons.contains(&CryptoError::InvalidPayloadLength { actual: 87 }));
    assert!(reasons
        .iter()
        .any(|r| matches!(r, CryptoError::InvalidPayloadEncoding(_))));
    assert!(result.malformed.iter().all(|m| m.identifier == tracked.id));
}

#[test]
fn test_bad_identifier_does_not_drop_batch() {
    let tracked = beacon();

    let mut bad_id = sealed(&tracked, 2);
    bad_id.id = "short==".to_string();

    let batch = ReportBatch::from_json(
        &json!({
            "statusCode": "200",
            "results": [sealed(&tracked, 1), bad_id]
        })
        .to_string(),
    )
    .unwrap();

    let grouped = batch.into_groups().unwrap();
    assert_eq!(grouped.rejected.len(), 1);
    assert_eq!(grouped.rejected[0].report.id, "short==");
    assert!(matches!(
        grouped.rejected[0].reason,
        CryptoError::InvalidKey { .. }
    ));

    let (registry, _) = KeyRegistry::build(vec![tracked.scalar.clone()]);
    let result = processor(UnmatchedPolicy::Reject, true)
        .run(&grouped.groups, &registry)
        .unwrap();
    assert_eq!(result.decrypted[&tracked.id], vec![fix(1)]);
    assert!(result.malformed.is_empty());
}

#[test]
fn test_reject_policy_lists_unmatched() {
    let tracked = beacon();
    let untracked = beacon();
    let groups = beacon_report_node::reports::group_reports(vec![
        sealed(&tracked, 1),
        sealed(&untracked, 2),
    ])
    .groups;
    let (registry, _) = KeyRegistry::build(vec![tracked.scalar.clone()]);

    match processor(UnmatchedPolicy::Reject, false).run(&groups, &registry) {
        Err(CorrelationError::Unmatched(ids)) => {
            assert_eq!(ids.len(), 1);
            assert!(ids.contains(&untracked.id));
        }
        other => panic!("Expected Unmatched, got {:?}", other),
    }
}

#[test]
fn test_all_matched_passes_reject_policy() {
    let tracked = beacon();
    let groups = beacon_report_node::reports::group_reports(vec![sealed(&tracked, 1)]).groups;
    let (registry, _) = KeyRegistry::build(vec![tracked.scalar.clone()]);

    let result = processor(UnmatchedPolicy::Reject, true)
        .run(&groups, &registry)
        .unwrap();
    assert_eq!(result.decrypted_count(), 1);
    assert!(result.unmatched.is_empty());
}

#[test]
fn test_parallel_matches_sequential() {
    let beacons: Vec<Beacon> = (0..6).map(|_| beacon()).collect();
    let reports: Vec<RawReport> = beacons
        .iter()
        .flat_map(|b| (0..4).map(move |i| sealed(b, i * 10)))
        .collect();
    let groups = beacon_report_node::reports::group_reports(reports).groups;
    let (registry, _) = KeyRegistry::build(beacons.iter().map(|b| b.scalar.clone()));

    let parallel = processor(UnmatchedPolicy::Reject, true).correlate(&groups, &registry);
    let sequential = processor(UnmatchedPolicy::Reject, false).correlate(&groups, &registry);
    assert_eq!(parallel, sequential);
    assert_eq!(parallel.decrypted_count(), 24);
}

#[test]
fn test_registry_collapses_duplicate_keys() {
    let tracked = beacon();
    let (registry, rejected) = KeyRegistry::build(vec![
        tracked.scalar.clone(),
        tracked.scalar.clone(),
        PrivateScalar::from_bytes([0u8; 28]),
    ]);

    assert_eq!(registry.len(), 1);
    assert!(registry.contains(&tracked.id));
    assert_eq!(rejected.len(), 1);
    assert!(matches!(rejected[0].reason, CryptoError::InvalidKey { .. }));
}

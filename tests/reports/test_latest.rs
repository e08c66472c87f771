// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for latest fix selection

use beacon_report_node::crypto::LookupIdentifier;
use beacon_report_node::reports::{latest_fix, latest_per_identifier, DecryptedFix};
use std::collections::BTreeMap;

fn fix(timestamp: i64, status: u8) -> DecryptedFix {
    DecryptedFix {
        timestamp,
        latitude: 0.0,
        longitude: 0.0,
        confidence: 0,
        horizontal_accuracy: 0,
        status,
    }
}

#[test]
fn test_latest_is_max_timestamp() {
    let history = vec![fix(10, 0), fix(30, 0), fix(20, 0)];
    assert_eq!(latest_fix(&history).unwrap().timestamp, 30);
}

#[test]
fn test_tie_keeps_first_seen() {
    let history = vec![fix(30, 1), fix(30, 2), fix(5, 3)];
    assert_eq!(latest_fix(&history).unwrap().status, 1);
}

#[test]
fn test_one_entry_per_identifier() {
    let a = LookupIdentifier::from_bytes([1u8; 32]);
    let b = LookupIdentifier::from_bytes([2u8; 32]);
    let mut decrypted = BTreeMap::new();
    decrypted.insert(a, vec![fix(1, 0), fix(3, 0)]);
    decrypted.insert(b, vec![fix(7, 0)]);
    decrypted.insert(LookupIdentifier::from_bytes([3u8; 32]), vec![]);

    let latest = latest_per_identifier(&decrypted);
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[&a].timestamp, 3);
    assert_eq!(latest[&b].timestamp, 7);
}

#[test]
fn test_empty_input() {
    assert!(latest_fix(&[]).is_none());
    assert!(latest_per_identifier(&BTreeMap::new()).is_empty());
}

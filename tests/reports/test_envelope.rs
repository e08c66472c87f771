// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for envelope layout discrimination

use beacon_report_node::crypto::CryptoError;
use beacon_report_node::reports::{parse_envelope, EnvelopeLayout, REPORT_EPOCH_OFFSET};

fn raw_report(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

#[test]
fn test_lengths_other_than_88_or_89_rejected() {
    for len in [0, 1, 57, 87, 90, 128] {
        assert_eq!(
            parse_envelope(&raw_report(len)),
            Err(CryptoError::InvalidPayloadLength { actual: len }),
            "length {} should be rejected",
            len
        );
    }
}

#[test]
fn test_compact_layout_offsets() {
    let raw = raw_report(88);
    let envelope = parse_envelope(&raw).unwrap();

    assert_eq!(envelope.layout, EnvelopeLayout::Compact);
    assert_eq!(envelope.confidence, 4);
    assert_eq!(&envelope.ephemeral_key[..], &raw[5..62]);
    assert_eq!(&envelope.ciphertext[..], &raw[62..72]);
    assert_eq!(&envelope.tag[..], &raw[72..88]);
}

#[test]
fn test_extended_layout_offsets() {
    let raw = raw_report(89);
    let envelope = parse_envelope(&raw).unwrap();

    assert_eq!(envelope.layout, EnvelopeLayout::Extended);
    assert_eq!(envelope.confidence, u16::from_be_bytes([4, 5]));
    assert_eq!(&envelope.ephemeral_key[..], &raw[6..63]);
    assert_eq!(&envelope.ciphertext[..], &raw[63..73]);
    assert_eq!(&envelope.tag[..], &raw[73..89]);
}

#[test]
fn test_timestamp_offset_from_2001() {
    let mut raw = vec![0u8; 88];
    raw[..4].copy_from_slice(&1_700_000_000u32.to_be_bytes());
    let envelope = parse_envelope(&raw).unwrap();
    assert_eq!(envelope.timestamp, 1_700_000_000 + 978_307_200);

    raw[..4].copy_from_slice(&[0, 0, 0, 0]);
    assert_eq!(parse_envelope(&raw).unwrap().timestamp, REPORT_EPOCH_OFFSET);
}

#[test]
fn test_to_bytes_reproduces_input() {
    for len in [88, 89] {
        let raw = raw_report(len);
        assert_eq!(parse_envelope(&raw).unwrap().to_bytes().unwrap(), raw);
    }
}

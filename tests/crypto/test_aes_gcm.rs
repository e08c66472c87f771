// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for AES-128-GCM with 16-byte IV and detached tag

use beacon_report_node::crypto::{decrypt_aes_gcm, encrypt_aes_gcm, CryptoError, ReportKeys};

fn keys() -> ReportKeys {
    ReportKeys {
        key: [0x2Bu8; 16],
        iv: [0x7Eu8; 16],
    }
}

#[test]
fn test_encrypt_then_decrypt() {
    let plaintext = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10];
    let (ciphertext, tag) = encrypt_aes_gcm(&keys(), &plaintext).unwrap();

    assert_eq!(ciphertext.len(), plaintext.len());
    assert_ne!(&ciphertext[..], &plaintext[..]);

    let decrypted = decrypt_aes_gcm(&keys(), &ciphertext, &tag).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn test_every_tag_bit_flip_rejected() {
    let (ciphertext, tag) = encrypt_aes_gcm(&keys(), &[0xAAu8; 10]).unwrap();

    for bit in 0..128 {
        let mut bad = tag;
        bad[bit / 8] ^= 1 << (bit % 8);
        assert_eq!(
            decrypt_aes_gcm(&keys(), &ciphertext, &bad),
            Err(CryptoError::AuthenticationFailed),
            "tag bit {} flip was accepted",
            bit
        );
    }
}

#[test]
fn test_ciphertext_tamper_rejected() {
    let (mut ciphertext, tag) = encrypt_aes_gcm(&keys(), &[0x55u8; 10]).unwrap();
    ciphertext[3] ^= 0x80;
    assert_eq!(
        decrypt_aes_gcm(&keys(), &ciphertext, &tag),
        Err(CryptoError::AuthenticationFailed)
    );
}

#[test]
fn test_wrong_key_rejected() {
    let (ciphertext, tag) = encrypt_aes_gcm(&keys(), &[0u8; 10]).unwrap();
    let other = ReportKeys {
        key: [0x2Cu8; 16],
        iv: [0x7Eu8; 16],
    };
    assert!(decrypt_aes_gcm(&other, &ciphertext, &tag).is_err());
}

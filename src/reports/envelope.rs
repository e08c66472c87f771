// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report envelope parsing
//!
//! A raw report is one of two fixed binary layouts, told apart only by
//! total length:
//!
//! ```text
//! Compact  (88 bytes): ts[0:4] conf[4]   eph[5:62] ct[62:72] tag[72:88]
//! Extended (89 bytes): ts[0:4] conf[4:6] eph[6:63] ct[63:73] tag[73:89]
//! ```
//!
//! The timestamp counts seconds from 2001-01-01T00:00:00Z.

use crate::crypto::aes_gcm::TAG_SIZE;
use crate::crypto::ecdh::EPHEMERAL_KEY_SIZE;
use crate::crypto::CryptoError;

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z
pub const REPORT_EPOCH_OFFSET: i64 = 978_307_200;

/// Size of the encrypted fix
pub const CIPHERTEXT_SIZE: usize = 10;

/// Length of a compact (single confidence byte) report
pub const COMPACT_REPORT_LEN: usize = 88;

/// Length of an extended (two confidence bytes) report
pub const EXTENDED_REPORT_LEN: usize = 89;

/// Envelope layout, selected by payload length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeLayout {
    /// 88 bytes, 1-byte confidence
    Compact,
    /// 89 bytes, 2-byte confidence
    Extended,
}

impl EnvelopeLayout {
    pub fn from_len(len: usize) -> Result<Self, CryptoError> {
        match len {
            COMPACT_REPORT_LEN => Ok(EnvelopeLayout::Compact),
            EXTENDED_REPORT_LEN => Ok(EnvelopeLayout::Extended),
            actual => Err(CryptoError::InvalidPayloadLength { actual }),
        }
    }

    pub fn confidence_len(self) -> usize {
        match self {
            EnvelopeLayout::Compact => 1,
            EnvelopeLayout::Extended => 2,
        }
    }

    pub fn total_len(self) -> usize {
        match self {
            EnvelopeLayout::Compact => COMPACT_REPORT_LEN,
            EnvelopeLayout::Extended => EXTENDED_REPORT_LEN,
        }
    }

    /// Offset of the ephemeral key; every later field follows it
    fn body_offset(self) -> usize {
        4 + self.confidence_len()
    }
}

/// Typed decomposition of a raw report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEnvelope {
    pub layout: EnvelopeLayout,
    /// Unix epoch seconds
    pub timestamp: i64,
    pub confidence: u16,
    pub ephemeral_key: [u8; EPHEMERAL_KEY_SIZE],
    pub ciphertext: [u8; CIPHERTEXT_SIZE],
    pub tag: [u8; TAG_SIZE],
}

impl ReportEnvelope {
    /// Serialize back into the wire layout
    ///
    /// # Errors
    ///
    /// `InvalidFix` if the timestamp falls outside the 32-bit report epoch
    /// window or the confidence does not fit a compact envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let raw_ts = encode_timestamp(self.timestamp)?;

        let mut out = Vec::with_capacity(self.layout.total_len());
        out.extend_from_slice(&raw_ts.to_be_bytes());
        match self.layout {
            EnvelopeLayout::Compact => {
                let confidence = u8::try_from(self.confidence).map_err(|_| CryptoError::InvalidFix {
                    field: "confidence",
                    reason: format!("{} does not fit a compact envelope", self.confidence),
                })?;
                out.push(confidence);
            }
            EnvelopeLayout::Extended => out.extend_from_slice(&self.confidence.to_be_bytes()),
        }
        out.extend_from_slice(&self.ephemeral_key);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        Ok(out)
    }
}

/// Convert Unix seconds to the report's 32-bit 2001-epoch counter
pub fn encode_timestamp(unix_secs: i64) -> Result<u32, CryptoError> {
    unix_secs
        .checked_sub(REPORT_EPOCH_OFFSET)
        .and_then(|raw| u32::try_from(raw).ok())
        .ok_or_else(|| CryptoError::InvalidFix {
            field: "timestamp",
            reason: format!(
                "{} is outside {}..={}",
                unix_secs,
                REPORT_EPOCH_OFFSET,
                REPORT_EPOCH_OFFSET + i64::from(u32::MAX)
            ),
        })
}

/// Split a raw report into its typed fields
///
/// # Errors
///
/// `InvalidPayloadLength` unless the payload is exactly 88 or 89 bytes.
pub fn parse_envelope(raw: &[u8]) -> Result<ReportEnvelope, CryptoError> {
    let layout = EnvelopeLayout::from_len(raw.len())?;

    let raw_ts = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let confidence = match layout {
        EnvelopeLayout::Compact => u16::from(raw[4]),
        EnvelopeLayout::Extended => u16::from_be_bytes([raw[4], raw[5]]),
    };

    let eph_start = layout.body_offset();
    let ct_start = eph_start + EPHEMERAL_KEY_SIZE;
    let tag_start = ct_start + CIPHERTEXT_SIZE;

    let mut ephemeral_key = [0u8; EPHEMERAL_KEY_SIZE];
    let mut ciphertext = [0u8; CIPHERTEXT_SIZE];
    let mut tag = [0u8; TAG_SIZE];
    ephemeral_key.copy_from_slice(&raw[eph_start..ct_start]);
    ciphertext.copy_from_slice(&raw[ct_start..tag_start]);
    tag.copy_from_slice(&raw[tag_start..]);

    Ok(ReportEnvelope {
        layout,
        timestamp: i64::from(raw_ts) + REPORT_EPOCH_OFFSET,
        confidence,
        ephemeral_key,
        ciphertext,
        tag,
    })
}

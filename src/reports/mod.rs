// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report Decryption & Correlation Engine
//!
//! Turns a batch of opaque location reports into decrypted fixes for the
//! devices whose keys the operator owns:
//!
//! - **Envelope**: splits a raw report into typed fields (88/89-byte layouts)
//! - **Decryptor**: ECDH + KDF + AES-GCM, then decodes the fix
//! - **Registry**: lookup identifier → private scalar, built per cycle
//! - **Correlation**: groups, decrypts and partitions a batch
//! - **Latest**: most recent fix per device
//! - **Sealer**: the finder side, for fixtures and tooling
//!
//! Everything here is synchronous and pure; the only parallelism is the
//! per-group fan-out inside correlation.

pub mod batch;
pub mod correlation;
pub mod decryptor;
pub mod envelope;
pub mod latest;
pub mod registry;
pub mod sealer;

pub use batch::{
    group_reports, BatchError, GroupedReports, RawReport, RejectedRecord, ReportBatch, ReportGroups,
    UpstreamStatus,
};
pub use correlation::{
    CorrelationConfig, CorrelationError, CorrelationProcessor, CorrelationResult, MalformedReport,
    UnmatchedPolicy,
};
pub use decryptor::{decrypt_payload, decrypt_report, DecryptedFix};
pub use envelope::{parse_envelope, EnvelopeLayout, ReportEnvelope, REPORT_EPOCH_OFFSET};
pub use latest::{latest_fix, latest_per_identifier};
pub use registry::{KeyRegistry, RejectedKey};
pub use sealer::{seal_report, seal_report_random};

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report batch wire types
//!
//! The location network answers a query with:
//!
//! ```json
//! {
//!   "statusCode": "200",
//!   "results": [
//!     { "id": "<identifier b64>", "payload": "<report b64>",
//!       "datePublished": 1700000000000, "statusCode": 0, "description": "found" }
//!   ]
//! }
//! ```

use crate::crypto::{CryptoError, LookupIdentifier};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Reports grouped by lookup identifier, each group in arrival order
pub type ReportGroups = BTreeMap<LookupIdentifier, Vec<RawReport>>;

/// One encrypted report as delivered by the network
///
/// `id` is kept as delivered; it is decoded when the batch is grouped so
/// one bad record cannot fail the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    /// Base64 of the 32-byte lookup identifier
    pub id: String,
    /// Base64 of the 88- or 89-byte envelope
    pub payload: String,
    #[serde(default)]
    pub date_published: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RawReport {
    pub fn from_bytes(id: LookupIdentifier, payload: &[u8], date_published: i64) -> Self {
        Self {
            id: id.to_base64(),
            payload: STANDARD.encode(payload),
            date_published,
            status_code: None,
            description: None,
        }
    }

    /// Decode the identifier this report was filed under
    pub fn identifier(&self) -> Result<LookupIdentifier, CryptoError> {
        self.id.parse()
    }

    /// Decode the base64 payload
    pub fn payload_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(STANDARD.decode(self.payload.trim())?)
    }
}

/// A record left out of grouping because its identifier did not decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub report: RawReport,
    pub reason: CryptoError,
}

/// Reports grouped by identifier, plus the records that could not be grouped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedReports {
    pub groups: ReportGroups,
    pub rejected: Vec<RejectedRecord>,
}

impl GroupedReports {
    pub fn report_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum::<usize>() + self.rejected.len()
    }
}

/// Upstream status, sent either as a string or a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamStatus {
    Number(i64),
    Text(String),
}

impl UpstreamStatus {
    pub fn is_success(&self) -> bool {
        match self {
            UpstreamStatus::Number(code) => *code == 200,
            UpstreamStatus::Text(code) => code.trim() == "200",
        }
    }
}

impl std::fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamStatus::Number(code) => write!(f, "{}", code),
            UpstreamStatus::Text(code) => f.write_str(code),
        }
    }
}

/// Errors raised before a batch reaches correlation
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Upstream informed an error: status {0}")]
    UpstreamStatus(String),

    #[error("No reports found in batch")]
    Empty,

    #[error("Failed to parse report batch: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A full query response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBatch {
    pub status_code: UpstreamStatus,
    #[serde(default)]
    pub results: Vec<RawReport>,
}

impl ReportBatch {
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, BatchError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Check the upstream status and group reports by identifier
    ///
    /// Records with an undecodable identifier are returned in
    /// `rejected`; they never fail the batch.
    pub fn into_groups(self) -> Result<GroupedReports, BatchError> {
        if !self.status_code.is_success() {
            return Err(BatchError::UpstreamStatus(self.status_code.to_string()));
        }
        if self.results.is_empty() {
            return Err(BatchError::Empty);
        }

        let grouped = group_reports(self.results);
        debug!(
            "Grouped batch into {} identifiers ({} records rejected)",
            grouped.groups.len(),
            grouped.rejected.len()
        );
        Ok(grouped)
    }
}

/// Group reports by identifier, keeping arrival order within each group
pub fn group_reports<I>(reports: I) -> GroupedReports
where
    I: IntoIterator<Item = RawReport>,
{
    let mut grouped = GroupedReports::default();
    for report in reports {
        match report.identifier() {
            Ok(identifier) => grouped.groups.entry(identifier).or_default().push(report),
            Err(reason) => {
                warn!("⚠️ Report with identifier {:?} rejected: {}", report.id, reason);
                grouped.rejected.push(RejectedRecord { report, reason });
            }
        }
    }
    grouped
}

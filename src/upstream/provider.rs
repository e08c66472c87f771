// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report source trait definition

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::crypto::LookupIdentifier;
use crate::reports::{BatchError, ReportBatch};

/// Smallest and largest query window accepted upstream
pub const MIN_WINDOW_HOURS: u32 = 1;
pub const MAX_WINDOW_HOURS: u32 = 24;

/// Errors raised while fetching a report batch
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Report source not configured: {reason}")]
    NotConfigured { reason: String },

    #[error("Upstream rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    #[error("Upstream request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Upstream request failed (status {status}): {message}")]
    Request { status: u16, message: String },

    #[error("Failed to read report batch: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// One search entry of an upstream query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWindow {
    /// Unix milliseconds
    pub start_date: i64,
    /// Unix milliseconds
    pub end_date: i64,
    pub ids: Vec<LookupIdentifier>,
}

/// Query body sent to the location network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub search: Vec<SearchWindow>,
}

impl ReportQuery {
    /// Query the last `hours` (clamped to 1..=24) ending at `now`
    pub fn for_window(ids: Vec<LookupIdentifier>, hours: u32, now: DateTime<Utc>) -> Self {
        let hours = hours.clamp(MIN_WINDOW_HOURS, MAX_WINDOW_HOURS);
        let start = now - Duration::hours(i64::from(hours));
        Self {
            search: vec![SearchWindow {
                start_date: start.timestamp() * 1000,
                end_date: now.timestamp() * 1000,
                ids,
            }],
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &LookupIdentifier> {
        self.search.iter().flat_map(|w| w.ids.iter())
    }
}

/// Trait for anything that can answer a report query
///
/// The network itself is one source; a batch file recorded earlier is another.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetch the encrypted reports matching `query`
    async fn fetch(&self, query: &ReportQuery) -> Result<ReportBatch, SourceError>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fix publication
//!
//! After each sync cycle the latest fix of every tracked device is handed
//! to a [`FixPublisher`]. Delivery to a telemetry bus lives behind this
//! trait; the crate ships a publisher that writes to the log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crypto::LookupIdentifier;
use crate::reports::DecryptedFix;

/// Payload handed to publishers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedFix {
    pub identifier: LookupIdentifier,
    pub friendly_name: Option<String>,
    #[serde(flatten)]
    pub fix: DecryptedFix,
    pub observed_at: Option<DateTime<Utc>>,
}

impl PublishedFix {
    pub fn new(identifier: LookupIdentifier, friendly_name: Option<String>, fix: DecryptedFix) -> Self {
        Self {
            identifier,
            friendly_name,
            observed_at: fix.observed_at(),
            fix,
        }
    }

    pub fn label(&self) -> String {
        self.friendly_name
            .clone()
            .unwrap_or_else(|| self.identifier.short())
    }
}

/// Destination for the latest fixes
#[async_trait]
pub trait FixPublisher: Send + Sync {
    /// Publish a set of fixes, returning how many were delivered
    async fn publish(&self, fixes: &[PublishedFix]) -> anyhow::Result<usize>;

    /// Publisher name for logging
    fn name(&self) -> &'static str;
}

/// Writes each fix to the log as JSON
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

impl LogPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FixPublisher for LogPublisher {
    async fn publish(&self, fixes: &[PublishedFix]) -> anyhow::Result<usize> {
        for fix in fixes {
            let payload = serde_json::to_string(fix)?;
            info!("📍 {} {}", fix.label(), payload);
        }
        Ok(fixes.len())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

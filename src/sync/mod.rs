// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Periodic sync of tracked devices
//!
//! One cycle: tracked keys → registry → upstream fetch → correlation →
//! fix store → latest fix per device → publisher. Identifiers the
//! registry does not know are omitted rather than failing the cycle, since
//! the query only ever asks for tracked identifiers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::publish::{FixPublisher, PublishedFix};
use crate::reports::{
    BatchError, CorrelationConfig, CorrelationError, CorrelationProcessor, KeyRegistry,
    UnmatchedPolicy,
};
use crate::storage::{FixStore, KeyStore};
use crate::upstream::{ReportQuery, ReportSource, SourceError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync requested too soon; retry in {retry_after_secs}s")]
    TooFrequent { retry_after_secs: u64 },

    #[error("Failed to fetch reports: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error("Failed to publish fixes: {0}")]
    Publish(String),
}

/// Counters for one sync cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub devices: usize,
    pub fetched: usize,
    pub decrypted: usize,
    pub new_fixes: usize,
    pub malformed: usize,
    pub published: usize,
}

/// Sync service settings
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub window_hours: u32,
    pub min_interval: Duration,
    pub parallel: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            window_hours: 1,
            min_interval: Duration::from_secs(60),
            parallel: true,
        }
    }
}

impl From<&GatewayConfig> for SyncSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            window_hours: config.upstream.window_hours,
            min_interval: config.sync.min_interval(),
            parallel: config.correlation.parallel,
        }
    }
}

/// Runs sync cycles against shared stores
pub struct SyncService {
    keys: KeyStore,
    fixes: FixStore,
    source: Arc<dyn ReportSource>,
    publisher: Arc<dyn FixPublisher>,
    settings: SyncSettings,
    last_cycle: Mutex<Option<Instant>>,
}

impl SyncService {
    pub fn new(
        keys: KeyStore,
        fixes: FixStore,
        source: Arc<dyn ReportSource>,
        publisher: Arc<dyn FixPublisher>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            keys,
            fixes,
            source,
            publisher,
            settings,
            last_cycle: Mutex::new(None),
        }
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn fixes(&self) -> &FixStore {
        &self.fixes
    }

    /// Run one cycle, refusing if the previous one started too recently
    pub async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
        {
            let mut last = self.last_cycle.lock().await;
            if let Some(started) = *last {
                let elapsed = started.elapsed();
                if elapsed < self.settings.min_interval {
                    let remaining = self.settings.min_interval - elapsed;
                    return Err(SyncError::TooFrequent {
                        retry_after_secs: remaining.as_secs().max(1),
                    });
                }
            }
            *last = Some(Instant::now());
        }

        let (registry, rejected) = KeyRegistry::build(self.keys.scalars().await);
        if !rejected.is_empty() {
            warn!("⚠️ {} tracked keys rejected by the registry", rejected.len());
        }

        let mut report = SyncReport {
            devices: registry.len(),
            ..SyncReport::default()
        };
        if registry.is_empty() {
            info!("No tracked devices, skipping sync");
            return Ok(report);
        }

        let query = ReportQuery::for_window(
            registry.identifiers(),
            self.settings.window_hours,
            Utc::now(),
        );
        let batch = self.source.fetch(&query).await?;
        report.fetched = batch.results.len();

        let grouped = match batch.into_groups() {
            Ok(grouped) => grouped,
            Err(BatchError::Empty) => {
                info!(
                    "🔄 Sync via {}: no new reports for {} devices",
                    self.source.name(),
                    report.devices
                );
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        };

        let processor = CorrelationProcessor::new(CorrelationConfig {
            unmatched_policy: UnmatchedPolicy::Omit,
            parallel: self.settings.parallel,
        });
        let result = processor.run(&grouped.groups, &registry)?;
        for rejected in &grouped.rejected {
            debug!("Malformed report for {:?}: {}", rejected.report.id, rejected.reason);
        }
        for malformed in &result.malformed {
            debug!(
                "Malformed report for {}: {}",
                malformed.identifier.short(),
                malformed.reason
            );
        }
        report.decrypted = result.decrypted_count();
        report.malformed = result.malformed.len() + grouped.rejected.len();
        report.new_fixes = self.fixes.store_decrypted(&result.decrypted).await;

        let latest = self.fixes.latest().await;
        let mut published = Vec::with_capacity(latest.len());
        for (identifier, fix) in latest {
            let name = self
                .keys
                .get(&identifier)
                .await
                .and_then(|device| device.friendly_name);
            published.push(PublishedFix::new(identifier, name, fix));
        }
        report.published = self
            .publisher
            .publish(&published)
            .await
            .map_err(|e| SyncError::Publish(e.to_string()))?;

        info!(
            "🔄 Sync via {} complete: {} reports, {} decrypted, {} new, {} published via {}",
            self.source.name(),
            report.fetched,
            report.decrypted,
            report.new_fixes,
            report.published,
            self.publisher.name()
        );
        Ok(report)
    }
}

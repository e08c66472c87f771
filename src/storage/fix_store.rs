// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decrypted Fix Storage Module
//!
//! Provides in-memory storage for decrypted fixes, grouped per device.
//! Sync cycles overlap in time, so the same report is usually fetched more
//! than once; storing a fix that is already present is a no-op.

use crate::crypto::LookupIdentifier;
use crate::reports::{latest_per_identifier, DecryptedFix};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Statistics about fix storage
#[derive(Debug, Clone, Default)]
pub struct FixStoreStats {
    pub total_fixes: usize,
    pub devices: usize,
    pub inserted: u64,
    pub duplicates: u64,
}

/// A fix together with when it entered the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFix {
    pub fix: DecryptedFix,
    pub stored_at: DateTime<Utc>,
}

/// In-memory storage for decrypted fixes
#[derive(Clone)]
pub struct FixStore {
    fixes: Arc<RwLock<BTreeMap<LookupIdentifier, Vec<StoredFix>>>>,
    stats: Arc<RwLock<FixStoreStats>>,
}

impl FixStore {
    /// Create a new fix store
    pub fn new() -> Self {
        Self {
            fixes: Arc::new(RwLock::new(BTreeMap::new())),
            stats: Arc::new(RwLock::new(FixStoreStats::default())),
        }
    }

    /// Store one fix, returning false if it was already present
    pub async fn store_fix(&self, identifier: LookupIdentifier, fix: DecryptedFix) -> bool {
        let mut fixes = self.fixes.write().await;
        let history = fixes.entry(identifier).or_default();

        let inserted = if history.iter().any(|stored| stored.fix == fix) {
            false
        } else {
            history.push(StoredFix {
                fix,
                stored_at: Utc::now(),
            });
            true
        };

        let mut stats = self.stats.write().await;
        if inserted {
            stats.inserted += 1;
        } else {
            stats.duplicates += 1;
        }
        stats.total_fixes = fixes.values().map(Vec::len).sum();
        stats.devices = fixes.len();

        inserted
    }

    /// Store every fix of a correlation result, returning how many were new
    pub async fn store_decrypted(
        &self,
        decrypted: &BTreeMap<LookupIdentifier, Vec<DecryptedFix>>,
    ) -> usize {
        let mut new_fixes = 0;
        for (identifier, fixes) in decrypted {
            for fix in fixes {
                if self.store_fix(*identifier, fix.clone()).await {
                    new_fixes += 1;
                }
            }
        }

        info!(
            "💾 Stored {} new fixes for {} devices",
            new_fixes,
            decrypted.len()
        );
        new_fixes
    }

    /// Fix history per device, in insertion order
    pub async fn history(&self) -> BTreeMap<LookupIdentifier, Vec<DecryptedFix>> {
        let fixes = self.fixes.read().await;
        fixes
            .iter()
            .map(|(id, stored)| (*id, stored.iter().map(|s| s.fix.clone()).collect()))
            .collect()
    }

    /// Fix history for a single device
    pub async fn history_for(&self, identifier: &LookupIdentifier) -> Vec<StoredFix> {
        let fixes = self.fixes.read().await;
        fixes.get(identifier).cloned().unwrap_or_default()
    }

    /// Most recent fix per device
    pub async fn latest(&self) -> BTreeMap<LookupIdentifier, DecryptedFix> {
        latest_per_identifier(&self.history().await)
    }

    /// Drop every fix of a device, returning how many were removed
    pub async fn remove_identifier(&self, identifier: &LookupIdentifier) -> usize {
        let mut fixes = self.fixes.write().await;
        let removed = fixes.remove(identifier).map(|h| h.len()).unwrap_or(0);

        let mut stats = self.stats.write().await;
        stats.total_fixes = fixes.values().map(Vec::len).sum();
        stats.devices = fixes.len();

        debug!("🗑️ Removed {} fixes for {}", removed, identifier.short());
        removed
    }

    /// Get the number of stored fixes
    pub async fn len(&self) -> usize {
        self.fixes.read().await.values().map(Vec::len).sum()
    }

    /// Check if store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get storage statistics
    pub async fn stats(&self) -> FixStoreStats {
        self.stats.read().await.clone()
    }
}

impl Default for FixStore {
    fn default() -> Self {
        Self::new()
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tracked Device Key Storage
//!
//! Holds the private keys of the devices the operator wants to follow.
//! Each key is stored with its derived advertisement key and lookup
//! identifier, so a device can be found or removed by any of the three.
//!
//! **Security**: Keys are stored in memory only and never logged.

use crate::crypto::{
    derive_advertisement_key, parse_private_key, sanitize_key_input, AdvertisementKey,
    CryptoError, LookupIdentifier, PrivateScalar,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A device registered for periodic sync
#[derive(Debug, Clone)]
pub struct TrackedDevice {
    pub identifier: LookupIdentifier,
    pub advertisement_key: AdvertisementKey,
    pub scalar: PrivateScalar,
    pub friendly_name: Option<String>,
}

impl TrackedDevice {
    pub fn new(scalar: PrivateScalar, friendly_name: Option<String>) -> Result<Self, CryptoError> {
        let advertisement_key = derive_advertisement_key(&scalar)?;
        Ok(Self {
            identifier: advertisement_key.lookup_identifier(),
            advertisement_key,
            scalar,
            friendly_name,
        })
    }

    /// Friendly name, or the short identifier when none was given
    pub fn label(&self) -> String {
        self.friendly_name
            .clone()
            .unwrap_or_else(|| self.identifier.short())
    }
}

/// Outcome of loading a key file
#[derive(Debug, Default, Clone)]
pub struct KeyFileSummary {
    pub added: usize,
    /// 1-based line numbers that held no usable key
    pub rejected_lines: Vec<usize>,
}

/// In-memory storage for tracked device keys
///
/// # Example
///
/// ```ignore
/// let store = KeyStore::new();
/// let device = store.add_key(scalar, Some("backpack".into())).await?;
/// let scalars = store.scalars().await;
/// store.remove(&device.identifier.to_base64()).await;
/// ```
#[derive(Clone)]
pub struct KeyStore {
    devices: Arc<RwLock<BTreeMap<LookupIdentifier, TrackedDevice>>>,
}

impl KeyStore {
    /// Create a new key store
    pub fn new() -> Self {
        Self {
            devices: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Track a device; re-adding a key replaces its friendly name
    pub async fn add_key(
        &self,
        scalar: PrivateScalar,
        friendly_name: Option<String>,
    ) -> Result<TrackedDevice, CryptoError> {
        let device = TrackedDevice::new(scalar, friendly_name)?;

        let mut devices = self.devices.write().await;
        devices.insert(device.identifier, device.clone());
        info!(
            "🔑 Tracking device {} (total devices: {})",
            device.label(),
            devices.len()
        );
        Ok(device)
    }

    /// Load a key file: one key per line, optionally followed by a name
    ///
    /// ```text
    /// # comment
    /// <base64-or-hex key> Backpack tag
    /// <base64-or-hex key>
    /// ```
    pub async fn load_key_file(&self, path: impl AsRef<Path>) -> Result<KeyFileSummary> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read key file {}", path.display()))?;

        let mut summary = KeyFileSummary::default();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, name) = match line.split_once(char::is_whitespace) {
                Some((key, name)) => (key, Some(name.trim().to_string())),
                None => (line, None),
            };

            let added = match parse_private_key(key) {
                Ok(scalar) => self.add_key(scalar, name).await.is_ok(),
                Err(_) => false,
            };
            if added {
                summary.added += 1;
            } else {
                summary.rejected_lines.push(index + 1);
            }
        }

        if !summary.rejected_lines.is_empty() {
            warn!(
                "⚠️ Key file {} had unusable keys on lines {:?}",
                path.display(),
                summary.rejected_lines
            );
        }
        Ok(summary)
    }

    pub async fn get(&self, identifier: &LookupIdentifier) -> Option<TrackedDevice> {
        self.devices.read().await.get(identifier).cloned()
    }

    pub async fn devices(&self) -> Vec<TrackedDevice> {
        self.devices.read().await.values().cloned().collect()
    }

    pub async fn scalars(&self) -> Vec<PrivateScalar> {
        self.devices
            .read()
            .await
            .values()
            .map(|d| d.scalar.clone())
            .collect()
    }

    pub async fn identifiers(&self) -> Vec<LookupIdentifier> {
        self.devices.read().await.keys().copied().collect()
    }

    /// Stop tracking a device
    ///
    /// `selector` may be the lookup identifier, the advertisement key (both
    /// base64) or the private key (base64 or hex).
    pub async fn remove(&self, selector: &str) -> Option<TrackedDevice> {
        let selector = sanitize_key_input(selector)?;
        let mut devices = self.devices.write().await;

        let matched = if let Ok(id) = selector.parse::<LookupIdentifier>() {
            Some(id)
        } else if let Ok(scalar) = parse_private_key(&selector) {
            devices
                .values()
                .find(|d| d.scalar == scalar || d.advertisement_key.to_base64() == selector)
                .map(|d| d.identifier)
        } else {
            None
        };
        let identifier = matched?;

        let removed = devices.remove(&identifier);
        if let Some(device) = &removed {
            info!(
                "🗑️  Stopped tracking {} (remaining: {})",
                device.label(),
                devices.len()
            );
        }
        removed
    }

    /// Get the number of tracked devices
    pub async fn count(&self) -> usize {
        self.devices.read().await.len()
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

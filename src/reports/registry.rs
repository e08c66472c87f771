// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key registry
//!
//! Maps lookup identifiers to the private scalars that can open their
//! reports. Built fresh for every processing cycle.

use crate::crypto::{derive_lookup_identifier, CryptoError, LookupIdentifier, PrivateScalar};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A key that did not make it into the registry
#[derive(Debug, Clone)]
pub struct RejectedKey {
    pub scalar: PrivateScalar,
    pub reason: CryptoError,
}

/// Lookup identifier → private scalar, unique by identifier
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: HashMap<LookupIdentifier, PrivateScalar>,
}

impl KeyRegistry {
    /// Build a registry from the operator's keys
    ///
    /// Invalid scalars are excluded and returned with `InvalidKey`. The same
    /// scalar supplied twice collapses into one entry. If two distinct
    /// scalars produce the same identifier, the later one wins and the
    /// displaced scalar is returned with `AmbiguousIdentifier`.
    pub fn build<I>(scalars: I) -> (Self, Vec<RejectedKey>)
    where
        I: IntoIterator<Item = PrivateScalar>,
    {
        let mut registry = Self::default();
        let mut rejected = Vec::new();

        for scalar in scalars {
            let identifier = match derive_lookup_identifier(&scalar) {
                Ok(id) => id,
                Err(reason) => {
                    debug!("Skipping invalid private key: {}", reason);
                    rejected.push(RejectedKey { scalar, reason });
                    continue;
                }
            };
            rejected.extend(registry.insert(identifier, scalar));
        }

        debug!(
            "🔑 Key registry built: {} identifiers, {} rejected",
            registry.len(),
            rejected.len()
        );
        (registry, rejected)
    }

    /// Register a scalar under its identifier
    ///
    /// Returns the displaced scalar when a different one was already
    /// registered for `identifier`.
    fn insert(&mut self, identifier: LookupIdentifier, scalar: PrivateScalar) -> Option<RejectedKey> {
        let previous = self.keys.insert(identifier, scalar.clone())?;
        if previous == scalar {
            return None;
        }

        warn!(
            "⚠️ Two distinct keys map to identifier {}; keeping the later one",
            identifier
        );
        Some(RejectedKey {
            scalar: previous,
            reason: CryptoError::AmbiguousIdentifier {
                identifier: identifier.to_base64(),
            },
        })
    }

    pub fn lookup(&self, identifier: &LookupIdentifier) -> Option<&PrivateScalar> {
        self.keys.get(identifier)
    }

    pub fn contains(&self, identifier: &LookupIdentifier) -> bool {
        self.keys.contains_key(identifier)
    }

    /// Registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<LookupIdentifier> {
        let mut ids: Vec<_> = self.keys.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report correlation
//!
//! Resolves each identifier group against the key registry, decrypts every
//! report independently and partitions the outcome into decrypted,
//! unmatched and malformed sets. A single bad report never aborts its
//! group or the batch.

use super::batch::{RawReport, ReportGroups};
use super::decryptor::{decrypt_payload, DecryptedFix};
use super::registry::KeyRegistry;
use crate::crypto::{CryptoError, LookupIdentifier, PrivateScalar};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// What to do with identifier groups that have no registered key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Any unmatched identifier rejects the whole batch
    #[default]
    Reject,
    /// Unmatched identifiers are left out of the output
    Omit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationConfig {
    pub unmatched_policy: UnmatchedPolicy,
    /// Decrypt identifier groups on the rayon thread pool
    pub parallel: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            unmatched_policy: UnmatchedPolicy::Reject,
            parallel: true,
        }
    }
}

/// A report that failed decoding, parsing or decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedReport {
    pub identifier: LookupIdentifier,
    pub payload: String,
    pub reason: CryptoError,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    #[error(
        "No private key registered for identifier(s): {}",
        .0.iter().map(LookupIdentifier::to_base64).collect::<Vec<_>>().join(", ")
    )]
    Unmatched(BTreeSet<LookupIdentifier>),
}

/// Three disjoint partitions of a report batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationResult {
    pub decrypted: BTreeMap<LookupIdentifier, Vec<DecryptedFix>>,
    pub unmatched: BTreeSet<LookupIdentifier>,
    pub malformed: Vec<MalformedReport>,
}

impl CorrelationResult {
    /// Apply the caller's unmatched policy
    pub fn enforce(self, policy: UnmatchedPolicy) -> Result<Self, CorrelationError> {
        match policy {
            UnmatchedPolicy::Reject if !self.unmatched.is_empty() => {
                Err(CorrelationError::Unmatched(self.unmatched))
            }
            _ => Ok(self),
        }
    }

    pub fn decrypted_count(&self) -> usize {
        self.decrypted.values().map(Vec::len).sum()
    }
}

/// Outcome of one identifier group
enum GroupOutcome {
    Matched {
        identifier: LookupIdentifier,
        fixes: Vec<DecryptedFix>,
        malformed: Vec<MalformedReport>,
    },
    Unmatched(LookupIdentifier),
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationProcessor {
    config: CorrelationConfig,
}

impl CorrelationProcessor {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Decrypt every group that has a registered key
    ///
    /// Output content depends only on the inputs. Maps are ordered by
    /// identifier and fixes keep their order within a group.
    pub fn correlate(&self, groups: &ReportGroups, registry: &KeyRegistry) -> CorrelationResult {
        let outcomes: Vec<GroupOutcome> = if self.config.parallel {
            groups
                .par_iter()
                .map(|(id, reports)| process_group(id, reports, registry))
                .collect()
        } else {
            groups
                .iter()
                .map(|(id, reports)| process_group(id, reports, registry))
                .collect()
        };

        let mut result = CorrelationResult::default();
        for outcome in outcomes {
            match outcome {
                GroupOutcome::Matched {
                    identifier,
                    fixes,
                    malformed,
                } => {
                    if !fixes.is_empty() {
                        result.decrypted.insert(identifier, fixes);
                    }
                    result.malformed.extend(malformed);
                }
                GroupOutcome::Unmatched(identifier) => {
                    result.unmatched.insert(identifier);
                }
            }
        }

        info!(
            "📍 Correlated {} groups: {} fixes decrypted, {} unmatched, {} malformed",
            groups.len(),
            result.decrypted_count(),
            result.unmatched.len(),
            result.malformed.len()
        );
        result
    }

    /// Correlate and apply the configured unmatched policy
    pub fn run(
        &self,
        groups: &ReportGroups,
        registry: &KeyRegistry,
    ) -> Result<CorrelationResult, CorrelationError> {
        self.correlate(groups, registry)
            .enforce(self.config.unmatched_policy)
    }
}

fn process_group(
    identifier: &LookupIdentifier,
    reports: &[RawReport],
    registry: &KeyRegistry,
) -> GroupOutcome {
    let Some(scalar) = registry.lookup(identifier) else {
        debug!("No key registered for {}", identifier);
        return GroupOutcome::Unmatched(*identifier);
    };

    let mut fixes = Vec::with_capacity(reports.len());
    let mut malformed = Vec::new();
    for report in reports {
        match open_report(report, scalar) {
            Ok(fix) => fixes.push(fix),
            Err(reason) => {
                warn!("⚠️ Report for {} rejected: {}", identifier.short(), reason);
                malformed.push(MalformedReport {
                    identifier: *identifier,
                    payload: report.payload.clone(),
                    reason,
                });
            }
        }
    }

    GroupOutcome::Matched {
        identifier: *identifier,
        fixes,
        malformed,
    }
}

fn open_report(report: &RawReport, scalar: &PrivateScalar) -> Result<DecryptedFix, CryptoError> {
    let raw = report.payload_bytes()?;
    decrypt_payload(&raw, scalar)
}

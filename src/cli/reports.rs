// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use super::keys::collect_keys;
use crate::crypto::{parse_private_key, LookupIdentifier};
use crate::reports::{
    latest_per_identifier, seal_report_random, CorrelationConfig, CorrelationProcessor,
    DecryptedFix, EnvelopeLayout, KeyRegistry, RawReport, ReportBatch, UnmatchedPolicy,
    UpstreamStatus,
};

/// Arguments for decrypt command
#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Report batch (JSON as returned by the location network)
    #[arg(long)]
    pub reports: PathBuf,

    /// Key file: one key per line, optionally followed by a name
    #[arg(long)]
    pub keys_file: Option<PathBuf>,

    /// Private key(s), base64 or hex, comma-separated
    #[arg(long = "key", value_delimiter = ',')]
    pub keys: Vec<String>,

    /// Also read keys from BEACON_PRIVATE_KEYS
    #[arg(long)]
    pub from_env: bool,

    /// Leave out identifiers with no key instead of failing
    #[arg(long)]
    pub skip_unmatched: bool,

    /// Only print the most recent fix per device
    #[arg(long)]
    pub latest: bool,

    /// Decrypt groups on a single thread
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for seal command
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Beacon private key (base64 or hex); the report is sealed to its public key
    #[arg(long)]
    pub key: String,

    #[arg(long, allow_hyphen_values = true)]
    pub latitude: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub longitude: f64,

    /// Unix seconds (defaults to now)
    #[arg(long)]
    pub timestamp: Option<i64>,

    #[arg(long, default_value_t = 0)]
    pub confidence: u16,

    #[arg(long, default_value_t = 0)]
    pub accuracy: u8,

    #[arg(long, default_value_t = 0)]
    pub status: u8,

    /// Use the 89-byte layout with a two-byte confidence
    #[arg(long)]
    pub extended: bool,

    /// Append the report to this batch file (created if missing)
    #[arg(long)]
    pub batch: Option<PathBuf>,
}

#[derive(Serialize)]
struct MalformedEntry {
    /// As delivered; may not be a valid identifier
    identifier: String,
    reason: String,
}

#[derive(Serialize)]
struct DecryptOutput<T: Serialize> {
    decrypted: BTreeMap<LookupIdentifier, T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unmatched: Vec<LookupIdentifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    malformed: Vec<MalformedEntry>,
}

/// Decrypt a saved batch with the given keys and print fixes as JSON
pub async fn decrypt(args: DecryptArgs) -> Result<()> {
    let store = collect_keys(args.keys_file.as_deref(), &args.keys, args.from_env).await?;
    let (registry, rejected) = KeyRegistry::build(store.scalars().await);
    for key in &rejected {
        warn!("⚠️ Key rejected: {}", key.reason);
    }

    let bytes = tokio::fs::read(&args.reports)
        .await
        .with_context(|| format!("Failed to read reports from {}", args.reports.display()))?;
    let grouped = ReportBatch::from_slice(&bytes)?.into_groups()?;

    let processor = CorrelationProcessor::new(CorrelationConfig {
        unmatched_policy: if args.skip_unmatched {
            UnmatchedPolicy::Omit
        } else {
            UnmatchedPolicy::Reject
        },
        parallel: !args.sequential,
    });
    let result = processor.run(&grouped.groups, &registry)?;

    let malformed = grouped
        .rejected
        .iter()
        .map(|r| MalformedEntry {
            identifier: r.report.id.clone(),
            reason: r.reason.to_string(),
        })
        .chain(result.malformed.iter().map(|m| MalformedEntry {
            identifier: m.identifier.to_base64(),
            reason: m.reason.to_string(),
        }))
        .collect();
    let unmatched = result.unmatched.iter().copied().collect();

    let json = if args.latest {
        serde_json::to_string_pretty(&DecryptOutput {
            decrypted: latest_per_identifier(&result.decrypted),
            unmatched,
            malformed,
        })?
    } else {
        serde_json::to_string_pretty(&DecryptOutput {
            decrypted: result.decrypted,
            unmatched,
            malformed,
        })?
    };
    println!("{}", json);
    Ok(())
}

/// Seal a fix to a beacon's key and print or append the raw report
pub async fn seal(args: SealArgs) -> Result<()> {
    let scalar = parse_private_key(&args.key)?;
    let secret = scalar.secret_key()?;
    let identifier = crate::crypto::derive_lookup_identifier(&scalar)?;

    let fix = DecryptedFix {
        timestamp: args.timestamp.unwrap_or_else(|| Utc::now().timestamp()),
        latitude: args.latitude,
        longitude: args.longitude,
        confidence: args.confidence,
        horizontal_accuracy: args.accuracy,
        status: args.status,
    };
    let layout = if args.extended {
        EnvelopeLayout::Extended
    } else {
        EnvelopeLayout::Compact
    };

    let raw = seal_report_random(&fix, &secret.public_key(), layout)?;
    let report = RawReport::from_bytes(identifier, &raw, Utc::now().timestamp_millis());

    match args.batch {
        Some(path) => {
            let mut batch = if path.exists() {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                ReportBatch::from_slice(&bytes)?
            } else {
                ReportBatch {
                    status_code: UpstreamStatus::Text("200".to_string()),
                    results: Vec::new(),
                }
            };
            batch.results.push(report);
            tokio::fs::write(&path, serde_json::to_vec_pretty(&batch)?)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                "✅ Appended report for {} to {} ({} reports)",
                identifier.short(),
                path.display(),
                batch.results.len()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

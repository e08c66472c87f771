// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use super::keys::collect_keys;
use crate::config::GatewayConfig;
use crate::publish::LogPublisher;
use crate::storage::FixStore;
use crate::sync::{SyncService, SyncSettings};
use crate::upstream::source_from_config;

/// Arguments for sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Gateway configuration file (TOML)
    #[arg(long, env = "BEACON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read reports from a saved batch instead of the network
    #[arg(long)]
    pub batch_file: Option<PathBuf>,

    /// Also read keys from BEACON_PRIVATE_KEYS
    #[arg(long)]
    pub from_env: bool,
}

/// Run a single sync cycle and print its summary
pub async fn sync_once(args: SyncArgs) -> Result<()> {
    let mut config = GatewayConfig::load(args.config.as_deref())?;
    if args.batch_file.is_some() {
        config.upstream.batch_file = args.batch_file;
    }

    let keys = collect_keys(config.keys.keys_file.as_deref(), &[], args.from_env).await?;
    let source = source_from_config(&config.upstream).context("Failed to set up report source")?;

    let service = SyncService::new(
        keys,
        FixStore::new(),
        source,
        Arc::new(LogPublisher::new()),
        SyncSettings::from(&config),
    );
    let report = service.run_cycle().await?;

    println!("🔄 Sync complete");
    println!("   Devices:   {}", report.devices);
    println!("   Reports:   {}", report.fetched);
    println!("   Decrypted: {}", report.decrypted);
    println!("   Malformed: {}", report.malformed);
    println!("   Published: {}", report.published);
    Ok(())
}

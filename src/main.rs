// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use beacon_report_node::{
    config::GatewayConfig,
    crypto::extract_private_keys_from_env,
    publish::LogPublisher,
    storage::{FixStore, KeyStore},
    sync::{SyncError, SyncService, SyncSettings},
    upstream::source_from_config,
    version,
};
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Beacon Report Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config_path = env::var("BEACON_CONFIG").ok().map(PathBuf::from);
    let config = GatewayConfig::load(config_path.as_deref())?;

    // Tracked devices: key file first, then BEACON_PRIVATE_KEYS
    let keys = KeyStore::new();
    if let Some(path) = &config.keys.keys_file {
        let summary = keys.load_key_file(path).await?;
        println!("🔑 Loaded {} keys from {}", summary.added, path.display());
    }
    match extract_private_keys_from_env() {
        Ok(parsed) => {
            for scalar in parsed.valid {
                if let Err(e) = keys.add_key(scalar, None).await {
                    warn!("⚠️ Skipping key from environment: {}", e);
                }
            }
        }
        Err(e) => info!("No keys from environment: {}", e),
    }
    if keys.count().await == 0 {
        warn!("⚠️ No tracked devices yet; cycles will be empty until keys are added");
    }

    let source = source_from_config(&config.upstream).context("Failed to set up report source")?;
    println!("📡 Report source: {}", source.name());

    let service = SyncService::new(
        keys,
        FixStore::new(),
        source,
        Arc::new(LogPublisher::new()),
        SyncSettings::from(&config),
    );

    let interval = config
        .sync
        .interval()
        .max(config.sync.min_interval())
        .max(Duration::from_secs(1));
    println!("🔄 Syncing every {}s", interval.as_secs());
    println!("\nPress Ctrl+C to shutdown...");

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service.run_cycle().await {
                    Ok(report) => info!(
                        "✅ Cycle done: {} devices, {} new fixes, {} published",
                        report.devices, report.new_fixes, report.published
                    ),
                    Err(SyncError::TooFrequent { retry_after_secs }) => {
                        warn!("⏳ Skipping cycle, retry in {}s", retry_after_secs)
                    }
                    Err(e) => error!("❌ Sync cycle failed: {}", e),
                }
            }
            _ = signal::ctrl_c() => {
                println!("\n🛑 Shutting down...");
                break;
            }
        }
    }

    let stats = service.fixes().stats().await;
    info!(
        "Stored {} fixes for {} devices ({} duplicates skipped)",
        stats.total_fixes, stats.devices, stats.duplicates
    );
    Ok(())
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod keys;
pub mod reports;
pub mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Beacon report gateway CLI
#[derive(Parser, Debug)]
#[command(name = "beacon-cli")]
#[command(version)]
#[command(about = "Decrypt and correlate crowdsourced beacon location reports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show advertisement key and lookup identifier for private keys
    DeriveId(keys::DeriveIdArgs),

    /// Decrypt a saved report batch
    Decrypt(reports::DecryptArgs),

    /// Seal a fix into a raw report (fixture generation)
    Seal(reports::SealArgs),

    /// Run one sync cycle
    Sync(sync::SyncArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::DeriveId(args) => keys::derive_id(args).await,
        Commands::Decrypt(args) => reports::decrypt(args).await,
        Commands::Seal(args) => reports::seal(args).await,
        Commands::Sync(args) => sync::sync_once(args).await,
    }
}

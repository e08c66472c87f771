// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::crypto::{extract_private_keys_from_env, parse_key_list, PRIVATE_KEYS_ENV};
use crate::storage::KeyStore;

/// Arguments for derive-id command
#[derive(Args, Debug)]
pub struct DeriveIdArgs {
    /// Private key(s), base64 or hex, comma-separated
    #[arg(long = "key", value_delimiter = ',')]
    pub keys: Vec<String>,

    /// Key file: one key per line, optionally followed by a name
    #[arg(long)]
    pub keys_file: Option<PathBuf>,

    /// Also read keys from BEACON_PRIVATE_KEYS
    #[arg(long)]
    pub from_env: bool,
}

/// Collect keys from a key file, inline arguments and optionally the environment
pub(crate) async fn collect_keys(
    keys_file: Option<&Path>,
    inline: &[String],
    from_env: bool,
) -> Result<KeyStore> {
    let store = KeyStore::new();

    if let Some(path) = keys_file {
        store.load_key_file(path).await?;
    }

    let parsed = parse_key_list(&inline.join(","));
    if !parsed.invalid.is_empty() {
        warn!("⚠️ {} --key entries rejected", parsed.invalid.len());
    }
    for scalar in parsed.valid {
        if let Err(e) = store.add_key(scalar, None).await {
            warn!("⚠️ Skipping key: {}", e);
        }
    }

    if from_env {
        for scalar in extract_private_keys_from_env()?.valid {
            if let Err(e) = store.add_key(scalar, None).await {
                warn!("⚠️ Skipping {} key: {}", PRIVATE_KEYS_ENV, e);
            }
        }
    }

    if store.count().await == 0 {
        return Err(anyhow!(
            "No usable private keys. Use --key, --keys-file or set {}",
            PRIVATE_KEYS_ENV
        ));
    }
    Ok(store)
}

/// Print advertisement key and lookup identifier for each private key
pub async fn derive_id(args: DeriveIdArgs) -> Result<()> {
    let store = collect_keys(args.keys_file.as_deref(), &args.keys, args.from_env).await?;

    for device in store.devices().await {
        println!("🔑 {}", device.label());
        println!("   Advertisement key: {}", device.advertisement_key);
        println!("   Lookup identifier: {}", device.identifier);
    }
    Ok(())
}

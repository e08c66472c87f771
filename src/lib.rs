// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod publish;
pub mod reports;
pub mod storage;
pub mod sync;
pub mod upstream;
pub mod version;

// Re-export main types
pub use config::GatewayConfig;
pub use crypto::{CryptoError, LookupIdentifier, PrivateScalar};
pub use reports::{
    CorrelationConfig, CorrelationProcessor, CorrelationResult, DecryptedFix, KeyRegistry,
    UnmatchedPolicy,
};
pub use storage::{FixStore, KeyStore};
pub use sync::{SyncError, SyncService};

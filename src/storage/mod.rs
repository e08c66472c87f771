// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod fix_store;
pub mod key_store;

// Re-export main types for convenience
pub use fix_store::{FixStore, FixStoreStats, StoredFix};
pub use key_store::{KeyFileSummary, KeyStore, TrackedDevice};

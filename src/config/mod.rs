// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod gateway;

pub use gateway::{
    CorrelationSettings, GatewayConfig, KeysConfig, SyncConfig, UpstreamConfig,
    DEFAULT_UPSTREAM_URL,
};

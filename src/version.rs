// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the beacon report node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-report-correlation-2025-11-03";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 1;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "p224-ecdh",
    "aes-128-gcm",
    "compact-envelope",
    "extended-envelope",
    "parallel-correlation",
    "unmatched-policy",
    "latest-fix",
    "periodic-sync",
    "file-report-source",
    "http-report-source",
];

/// Report envelope lengths understood by the decoder
pub const SUPPORTED_REPORT_LENGTHS: &[usize] = &[88, 89];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Beacon Report Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
        "report_lengths": SUPPORTED_REPORT_LENGTHS,
    })
}

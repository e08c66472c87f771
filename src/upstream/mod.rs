// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report sources
//!
//! A [`ReportSource`] answers a [`ReportQuery`] with a raw batch. The live
//! network client and a file-backed source share the trait so the sync
//! cycle does not care where reports come from.

pub mod file;
pub mod http;
pub mod provider;

pub use file::FileReportSource;
pub use http::HttpReportSource;
pub use provider::{
    ReportQuery, ReportSource, SearchWindow, SourceError, MAX_WINDOW_HOURS, MIN_WINDOW_HOURS,
};

use crate::config::UpstreamConfig;
use std::sync::Arc;

/// Pick a source from configuration: a batch file wins over the network
pub fn source_from_config(config: &UpstreamConfig) -> Result<Arc<dyn ReportSource>, SourceError> {
    match &config.batch_file {
        Some(path) => Ok(Arc::new(FileReportSource::new(path))),
        None => Ok(Arc::new(HttpReportSource::from_config(config)?)),
    }
}

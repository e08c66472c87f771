// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report source backed by a recorded batch file

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::{ReportQuery, ReportSource, SourceError};
use crate::reports::ReportBatch;

/// Reads a JSON batch from disk on every fetch
///
/// Reports for identifiers outside the query are dropped, matching what the
/// network would have returned.
pub struct FileReportSource {
    path: PathBuf,
}

impl FileReportSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSource for FileReportSource {
    async fn fetch(&self, query: &ReportQuery) -> Result<ReportBatch, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let mut batch = ReportBatch::from_slice(&bytes)?;

        let total = batch.results.len();
        batch
            .results
            .retain(|report| match report.identifier() {
                Ok(identifier) => query.ids().any(|id| *id == identifier),
                // left for grouping to report
                Err(_) => true,
            });
        debug!(
            "Read {} reports from {} ({} matched the query)",
            total,
            self.path.display(),
            batch.results.len()
        );
        Ok(batch)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

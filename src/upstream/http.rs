// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Location network report source
//!
//! POSTs a [`ReportQuery`] to the fetch endpoint with basic auth built from
//! the operator's account identifier and search token. Obtaining those
//! credentials is out of scope; they come from configuration.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::provider::{ReportQuery, ReportSource, SourceError};
use crate::config::UpstreamConfig;
use crate::reports::ReportBatch;

/// HTTP report source
pub struct HttpReportSource {
    url: String,
    username: String,
    token: String,
    timeout_secs: u64,
    client: Client,
}

impl HttpReportSource {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::NotConfigured {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            url: url.into(),
            username: username.into(),
            token: token.into(),
            timeout_secs,
            client,
        })
    }

    /// Build from configuration; credentials are required
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, SourceError> {
        let username = config
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SourceError::NotConfigured {
                reason: "upstream username missing".to_string(),
            })?;
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SourceError::NotConfigured {
                reason: "upstream token missing".to_string(),
            })?;

        Self::new(config.url.clone(), username, token, config.timeout_secs)
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn fetch(&self, query: &ReportQuery) -> Result<ReportBatch, SourceError> {
        debug!("Querying {} for {} identifiers", self.url, query.ids().count());

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.token))
            .json(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    SourceError::Request {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(SourceError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Request {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(|e| SourceError::Request {
            status: status.as_u16(),
            message: format!("Failed to read body: {}", e),
        })?;
        let batch = ReportBatch::from_slice(&body)?;

        info!(
            "📡 Upstream returned {} reports (status {})",
            batch.results.len(),
            batch.status_code
        );
        Ok(batch)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

//! HTTP client for the referral endpoints.

use std::time::Duration;

use reqwest::Client;

use super::error::ApiError;
use crate::core::stats::SummaryStats;
use crate::core::tree::ReferralTree;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const TREE_ENDPOINT: &str = "/referrals/tree";
pub const STATS_ENDPOINT: &str = "/referrals/stats";
pub const EXPORT_ENDPOINT: &str = "/referrals/tree/export?format=png";

#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Client::new(),
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// GET `endpoint` and return the body of a 2xx response.
    async fn get_bytes(&self, endpoint: &str, accept: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET");
        let response = self
            .inner
            .get(&url)
            .header("accept", accept)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, url });
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn fetch_tree(&self) -> Result<ReferralTree, ApiError> {
        let body = self.get_bytes(TREE_ENDPOINT, "application/json").await?;
        let tree = ReferralTree::from_json(&body)?;
        tracing::info!(nodes = tree.len(), "referral tree loaded");
        Ok(tree)
    }

    pub async fn fetch_stats(&self) -> Result<SummaryStats, ApiError> {
        let body = self.get_bytes(STATS_ENDPOINT, "application/json").await?;
        serde_json::from_slice(&body).map_err(ApiError::Stats)
    }

    /// Download the server-rendered PNG.  The blob is checked for a PNG
    /// signature so an HTML error page is never saved as an image.
    pub async fn export_png(&self) -> Result<Vec<u8>, ApiError> {
        let body = self.get_bytes(EXPORT_ENDPOINT, "image/png").await?;
        match image::guess_format(&body) {
            Ok(image::ImageFormat::Png) => Ok(body),
            _ => Err(ApiError::NotPng),
        }
    }
}

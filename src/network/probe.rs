//! One-shot HTTP liveness probe.

use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, Url};
use tracing::debug;

use crate::common::error::ProbeError;
use crate::config::types::ProbeConfig;

/// Checks a health endpoint with a lightweight `HEAD` request.
///
/// Independent of any reconnect manager; cheap to clone.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: Client,
    url: Url,
}

impl HealthProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let url = Url::parse(&config.url).map_err(|e| ProbeError::InvalidUrl {
            url: config.url.clone(),
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `true` only for an error-free 2xx response.
    pub async fn check(&self) -> bool {
        let result = self
            .client
            .head(self.url.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Health check {} returned {}", self.url, response.status());
                false
            }
            Err(e) => {
                debug!("Health check {} failed: {}", self.url, e);
                false
            }
        }
    }
}

use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }

    /// Fetch a URL as text, single attempt.
    ///
    /// A non-2xx status is logged and yields `Ok(None)`; transport failures
    /// are errors.
    pub async fn get_text(&self, url: &str) -> Result<Option<String>> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Failed to fetch page, status code: {}", status.as_u16());
            return Ok(None);
        }

        let text = resp.text().await.context("Failed to read response body")?;
        debug!("{}: {} bytes", url, text.len());
        Ok(Some(text))
    }
}

use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn, preview, DEFAULT_PREVIEW_CHARS};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid delivery target: {0}")]
    InvalidTarget(String),
    #[error("delivery timed out")]
    Timeout,
    #[error("delivery target answered with http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
}

/// Sends one block of text to a destination.
#[async_trait::async_trait]
pub trait Deliverer: Send + Sync {
    /// Human readable name of the destination, for logs.
    fn target(&self) -> &str;

    async fn deliver(&self, block: &str) -> Result<(), DeliveryError>;
}

/// Posts `{"content": block}` to a chat webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookDeliverer {
    client: reqwest::Client,
    url: reqwest::Url,
    label: String,
}

impl WebhookDeliverer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let url = reqwest::Url::parse(url)
            .map_err(|err| DeliveryError::InvalidTarget(err.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DeliveryError::Network(err.to_string()))?;
        // Webhook URLs carry their token in the path; keep it out of logs.
        let label = format!("{}://{}", url.scheme(), url.host_str().unwrap_or("?"));
        Ok(Self { client, url, label })
    }
}

#[async_trait::async_trait]
impl Deliverer for WebhookDeliverer {
    fn target(&self) -> &str {
        &self.label
    }

    async fn deliver(&self, block: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&json!({ "content": block }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

/// Logs blocks instead of sending them.
#[derive(Debug, Clone)]
pub struct DryRunDeliverer {
    label: String,
}

impl DryRunDeliverer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait::async_trait]
impl Deliverer for DryRunDeliverer {
    fn target(&self) -> &str {
        &self.label
    }

    async fn deliver(&self, block: &str) -> Result<(), DeliveryError> {
        engine_info!("[dry-run {}] block:\n{}", self.label, block);
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        return DeliveryError::Timeout;
    }
    DeliveryError::Network(err.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub skipped: usize,
    /// Index of the block in the input slice and why it failed.
    pub failures: Vec<(usize, DeliveryError)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delivers blocks one at a time, in order. Blank blocks are skipped and a
/// failed block does not stop the ones after it.
pub async fn deliver_blocks(deliverer: &dyn Deliverer, blocks: &[String]) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for (index, block) in blocks.iter().enumerate() {
        if block.trim().is_empty() {
            report.skipped += 1;
            continue;
        }
        match deliverer.deliver(block).await {
            Ok(()) => {
                engine_debug!(
                    "delivered block {}/{} to {}: {}",
                    index + 1,
                    blocks.len(),
                    deliverer.target(),
                    preview(block, DEFAULT_PREVIEW_CHARS)
                );
                report.delivered += 1;
            }
            Err(err) => {
                engine_warn!(
                    "block {}/{} to {} failed: {}",
                    index + 1,
                    blocks.len(),
                    deliverer.target(),
                    err
                );
                report.failures.push((index, err));
            }
        }
    }
    report
}

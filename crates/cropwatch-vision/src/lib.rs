//! Camera prediction service client.
//!
//! The health check depends on [`PredictionSource`] rather than on HTTP
//! directly, so tests and alternative backends can supply predictions.

use std::time::Duration;

use async_trait::async_trait;
use cropwatch_core::Prediction;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Errors from fetching predictions.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Prediction request failed: {0}")]
    Request(String),

    #[error("Prediction service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode predictions: {0}")]
    Decode(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl VisionError {
    fn is_retryable(&self) -> bool {
        match self {
            VisionError::Request(_) => true,
            VisionError::Status { status, .. } => status.is_server_error(),
            VisionError::Decode(_) | VisionError::Client(_) => false,
        }
    }
}

/// Anything that can supply the current list of camera predictions.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn fetch_predictions(&self) -> Result<Vec<Prediction>, VisionError>;
}

/// HTTP client for the camera prediction service.
pub struct HttpPredictionClient {
    client: Client,
    url: String,
    max_retries: u32,
}

impl HttpPredictionClient {
    pub fn new(url: impl Into<String>, timeout: Duration, max_retries: u32) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VisionError::Client(e.to_string()))?;
        let url = url.into();
        info!("HttpPredictionClient: url={}, max_retries={}", url, max_retries);
        Ok(Self {
            client,
            url,
            max_retries,
        })
    }

    async fn fetch_once(&self) -> Result<Vec<Prediction>, VisionError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| VisionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status { status, body });
        }

        let records = response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| VisionError::Decode(e.to_string()))?;
        Ok(decode_predictions(records))
    }
}

/// Decodes each record on its own; malformed records are logged and skipped.
fn decode_predictions(records: Vec<Value>) -> Vec<Prediction> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Prediction>(record) {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                warn!(index, "Skipping malformed prediction record: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl PredictionSource for HttpPredictionClient {
    async fn fetch_predictions(&self) -> Result<Vec<Prediction>, VisionError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(predictions) => {
                    info!(count = predictions.len(), attempt, "Fetched camera predictions");
                    return Ok(predictions);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, max_retries = self.max_retries, "Prediction fetch failed, retrying: {}", e);
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

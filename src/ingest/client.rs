//! HTTP client for the ingestion API

use super::payload::IngestPayload;
use crate::config::IngestConfig;
use crate::mail::ClassifiedMessage;
use crate::metrics::METRICS;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

/// Ingestion transport errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Answer from the API for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Rejected { status: StatusCode, body: String },
}

/// Final state of one message in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Rejected(StatusCode),
    Failed(String),
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
        }
    }
}

/// Per-message results of a batch, in input order
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub results: Vec<(String, DeliveryStatus)>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|(_, s)| s.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.delivered()
    }

    /// Ids of messages the API accepted
    pub fn delivered_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|(_, s)| s.is_delivered())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn status(&self, id: &str) -> Option<&DeliveryStatus> {
        self.results.iter().find(|(i, _)| i == id).map(|(_, s)| s)
    }
}

/// Placeholder id used in reports for messages without one
pub const MISSING_ID: &str = "<no-id>";

/// Ingestion API client
pub struct IngestClient {
    http: Client,
    config: IngestConfig,
}

impl IngestClient {
    pub fn new(config: IngestConfig) -> Result<Self, IngestError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// POST one message
    ///
    /// Non-2xx answers come back as [`DeliveryOutcome::Rejected`]; only
    /// transport problems are errors. No retry is attempted.
    pub async fn send(&self, message: &ClassifiedMessage) -> Result<DeliveryOutcome, IngestError> {
        let payload = IngestPayload::from_classified(message, Utc::now());
        debug!(id = %payload.id, category = %payload.category, "Sending message to ingestion API");

        let response = self
            .http
            .post(&self.config.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IngestError::Timeout(e.to_string())
                } else {
                    IngestError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeliveryOutcome::Delivered);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("Ingestion API returned {}: {}", status, body);

        Ok(DeliveryOutcome::Rejected { status, body })
    }

    /// Send messages one at a time; a failure never stops the batch
    pub async fn send_batch(&self, messages: &[ClassifiedMessage]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for message in messages {
            let id = if message.id().is_empty() {
                MISSING_ID.to_string()
            } else {
                message.id().to_string()
            };

            let status = match self.send(message).await {
                Ok(DeliveryOutcome::Delivered) => DeliveryStatus::Delivered,
                Ok(DeliveryOutcome::Rejected { status, .. }) => DeliveryStatus::Rejected(status),
                Err(e) => {
                    error!("Failed to deliver message {}: {}", id, e);
                    DeliveryStatus::Failed(e.to_string())
                }
            };

            METRICS.record_delivery(status.as_str());
            report.results.push((id, status));
        }

        info!(
            "Delivered {}/{} messages to {}",
            report.delivered(),
            report.results.len(),
            self.config.url
        );

        report
    }
}

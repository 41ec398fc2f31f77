//! Polling loop: fetch, classify, deliver, mark read
//!
//! A failing cycle is logged and the loop waits for the next interval; the
//! process never stops because of one bad cycle.

use crate::classifier::Classifier;
use crate::error::Result;
use crate::ingest::IngestClient;
use crate::mail::MailSource;
use crate::metrics::METRICS;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counts for one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Components a cycle runs through
#[derive(Clone)]
pub struct Pipeline {
    pub source: Arc<dyn MailSource>,
    pub classifier: Arc<Classifier>,
    pub ingest: Arc<IngestClient>,
    /// Flag delivered messages as read on the source
    pub mark_read: bool,
}

impl Pipeline {
    /// One fetch, classify, deliver pass
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let messages = self.source.fetch_messages().await?;
        METRICS.record_fetched(messages.len());

        if messages.is_empty() {
            debug!("No new messages from {}", self.source.name());
            return Ok(CycleSummary::default());
        }

        let classified = self.classifier.classify_all(&messages);
        for message in &classified {
            debug!(
                id = %message.id(),
                category = %message.category_label(),
                subject = %message.message.subject,
                "Classified"
            );
        }

        let report = self.ingest.send_batch(&classified).await;

        if self.mark_read {
            let delivered = report.delivered_ids();
            if !delivered.is_empty() {
                // Delivery already happened; a failure here only means a resend later
                if let Err(e) = self.source.mark_read(&delivered).await {
                    warn!("Failed to mark {} messages as read: {}", delivered.len(), e);
                }
            }
        }

        Ok(CycleSummary {
            fetched: messages.len(),
            delivered: report.delivered(),
            failed: report.failed(),
        })
    }
}

/// Spawn the background polling task
///
/// The first cycle starts immediately; `interval` is the pause between the
/// end of one cycle and the start of the next.
pub fn spawn_poller(pipeline: Pipeline, interval: Duration) -> tokio::task::JoinHandle<()> {
    info!("Polling every {} seconds", interval.as_secs());

    tokio::spawn(async move {
        loop {
            let start = Instant::now();
            match pipeline.run_cycle().await {
                Ok(summary) => {
                    METRICS.record_cycle(true, start.elapsed().as_secs_f64());
                    if summary.fetched > 0 {
                        info!(
                            "Cycle done: fetched={}, delivered={}, failed={}",
                            summary.fetched, summary.delivered, summary.failed
                        );
                    }
                }
                Err(e) => {
                    METRICS.record_cycle(false, start.elapsed().as_secs_f64());
                    warn!("Polling cycle failed: {}", e);
                }
            }
            tokio::time::sleep(interval).await;
        }
    })
}

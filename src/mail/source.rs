//! Mailbox retrieval seam

use super::models::InboundMessage;
use crate::error::Result;
use async_trait::async_trait;

/// Source of inbound messages
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch the current batch of candidate messages, newest first
    async fn fetch_messages(&self) -> Result<Vec<InboundMessage>>;

    /// Flag messages as read once they have been handled
    async fn mark_read(&self, ids: &[String]) -> Result<()>;

    /// Short name for logs
    fn name(&self) -> &str;
}

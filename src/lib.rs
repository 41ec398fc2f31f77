//! Inbox triage
//!
//! Polls a mailbox for unread messages from one sender, assigns each message
//! a single category from a keyword taxonomy, and forwards it to an
//! ingestion API.

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ingest;
pub mod mail;
pub mod metrics;
pub mod poller;

pub use classifier::{Category, Classifier, Taxonomy};
pub use config::AppConfig;
pub use error::{Result, TriageError};
pub use mail::{ClassifiedMessage, InboundMessage};

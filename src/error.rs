//! Error types

use crate::classifier::TaxonomyError;
use crate::ingest::IngestError;

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, TriageError>;

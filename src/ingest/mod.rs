//! Delivery of classified messages to the ingestion API

pub mod client;
pub mod payload;

pub use client::{DeliveryOutcome, DeliveryReport, DeliveryStatus, IngestClient, IngestError, MISSING_ID};
pub use payload::{normalize_date, IngestPayload, NormalizedDate};

//! Payload sent to the ingestion API

use crate::mail::ClassifiedMessage;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Ingestion API request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestPayload {
    pub id: String,
    pub subject: String,
    /// The message snippet
    pub body: String,
    pub category: String,
    /// ISO-8601 UTC, e.g. `2025-11-16T13:30:39.557Z`
    pub date: String,
}

impl IngestPayload {
    /// Build a payload, using `now` when the message date cannot be parsed
    pub fn from_classified(message: &ClassifiedMessage, now: DateTime<Utc>) -> Self {
        let inbound = &message.message;
        Self {
            id: inbound.id.clone(),
            subject: inbound.subject.clone(),
            body: inbound.snippet.clone(),
            category: message.category.label.clone(),
            date: normalize_date(&inbound.date, now).to_iso(),
        }
    }
}

/// Result of interpreting a `Date` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedDate {
    /// Header parsed, converted to UTC
    Parsed(DateTime<Utc>),
    /// Header missing or unparsable, substitute time used
    Fallback(DateTime<Utc>),
}

impl NormalizedDate {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Parsed(dt) | Self::Fallback(dt) => *dt,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn to_iso(&self) -> String {
        self.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Parse an RFC 2822 style date header into UTC
///
/// Headers without a zone are read as UTC. Anything unparsable yields
/// [`NormalizedDate::Fallback`] carrying `now`.
pub fn normalize_date(raw: &str, now: DateTime<Utc>) -> NormalizedDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return NormalizedDate::Fallback(now);
    }

    mailparse::dateparse(raw)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(NormalizedDate::Parsed)
        .unwrap_or(NormalizedDate::Fallback(now))
}

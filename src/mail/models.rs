//! Mail records flowing through the pipeline

use serde::{Deserialize, Serialize};

/// A message as retrieved from the mailbox
///
/// Every field defaults to empty so partially decoded messages still flow
/// through classification and delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    /// Raw `Date` header, not necessarily RFC 2822
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Leading text of the plain-text body, the only body text kept
    #[serde(default)]
    pub snippet: String,
}

impl InboundMessage {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }
}

/// Category assigned to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedCategory {
    pub key: String,
    pub label: String,
    pub rank: usize,
    /// Distinct triggers matched for this category, 0 for the fallback
    pub score: usize,
}

/// An inbound message annotated with its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMessage {
    #[serde(flatten)]
    pub message: InboundMessage,
    pub category: AssignedCategory,
}

impl ClassifiedMessage {
    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn category_label(&self) -> &str {
        &self.category.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let message: InboundMessage = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(message.id, "7");
        assert_eq!(message.subject, "");
        assert_eq!(message.date, "");
        assert!(message.labels.is_empty());
        assert_eq!(message.snippet, "");
    }

    #[test]
    fn test_classified_message_flattens_record() {
        let classified = ClassifiedMessage {
            message: InboundMessage::new("3", "Aviso").with_snippet("Prazo encerrado"),
            category: AssignedCategory {
                key: "coordination_notices".to_string(),
                label: "Avisos da Coordenação / Secretaria".to_string(),
                rank: 2,
                score: 2,
            },
        };

        let json = serde_json::to_value(&classified).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["snippet"], "Prazo encerrado");
        assert_eq!(json["category"]["key"], "coordination_notices");
        assert_eq!(classified.category_label(), "Avisos da Coordenação / Secretaria");
    }
}

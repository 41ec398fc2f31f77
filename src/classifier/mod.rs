//! Keyword classification of mailbox messages
//!
//! Every message is assigned exactly one category:
//! - subject and snippet are normalized and joined
//! - each scored category counts its distinct triggers found as whole words
//! - the highest count wins, ties go to the lower priority rank
//! - no match at all yields the fallback category

pub mod matcher;
pub mod normalize;
pub mod taxonomy;

pub use matcher::contains_trigger;
pub use normalize::normalize;
pub use taxonomy::{
    builtin_definition, Category, CategoryId, CategoryDef, FallbackDef, Taxonomy, TaxonomyError,
    TaxonomyDef,
};

use crate::mail::{AssignedCategory, ClassifiedMessage, InboundMessage};
use crate::metrics::METRICS;
use tracing::debug;

/// Per-category count of distinct matched triggers for one text
///
/// Entries are in priority order and only categories with a positive count
/// are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTally {
    entries: Vec<(CategoryId, usize)>,
}

impl MatchTally {
    pub fn count(&self, id: CategoryId) -> usize {
        self.entries
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest count, lowest rank on ties
    pub fn winner(&self) -> Option<(CategoryId, usize)> {
        let mut best: Option<(CategoryId, usize)> = None;
        for &(id, count) in &self.entries {
            match best {
                Some((best_id, best_count))
                    if count < best_count || (count == best_count && id > best_id) => {}
                _ => best = Some((id, count)),
            }
        }
        best
    }
}

/// Outcome of classifying one text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub category: &'a Category,
    /// Distinct triggers matched by the winning category
    pub score: usize,
}

impl Classification<'_> {
    pub fn is_fallback(&self) -> bool {
        self.score == 0
    }

    pub fn to_assigned(&self) -> AssignedCategory {
        AssignedCategory {
            key: self.category.key().to_string(),
            label: self.category.label().to_string(),
            rank: self.category.rank(),
            score: self.score,
        }
    }
}

/// Stateless classifier over an immutable taxonomy
///
/// Safe to share across threads and tasks behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    taxonomy: Taxonomy,
}

impl Classifier {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Count matched triggers per category in already normalized text
    pub fn tally(&self, normalized_text: &str) -> MatchTally {
        let entries = self
            .taxonomy
            .scored()
            .iter()
            .filter_map(|category| {
                let count = category
                    .triggers()
                    .filter(|trigger| contains_trigger(normalized_text, trigger))
                    .count();
                (count > 0).then_some((category.id(), count))
            })
            .collect();

        MatchTally { entries }
    }

    /// Classify a subject and snippet pair
    pub fn classify_text(&self, subject: &str, snippet: &str) -> Classification<'_> {
        let full_text = format!("{} {}", normalize(subject), normalize(snippet));
        let tally = self.tally(&full_text);

        match tally.winner().and_then(|(id, score)| {
            self.taxonomy.get(id).map(|category| Classification { category, score })
        }) {
            Some(classification) => classification,
            None => Classification {
                category: self.taxonomy.fallback(),
                score: 0,
            },
        }
    }

    /// Category for a single message
    pub fn classify(&self, message: &InboundMessage) -> &Category {
        self.classify_message(message).category
    }

    /// Category and score for a single message
    pub fn classify_message(&self, message: &InboundMessage) -> Classification<'_> {
        let classification = self.classify_text(&message.subject, &message.snippet);
        debug!(
            id = %message.id,
            category = classification.category.key(),
            score = classification.score,
            "Message classified"
        );
        classification
    }

    /// Annotate a batch of messages, preserving input order
    ///
    /// Inputs are left untouched; each output holds a copy of its message.
    pub fn classify_all(&self, messages: &[InboundMessage]) -> Vec<ClassifiedMessage> {
        messages
            .iter()
            .map(|message| {
                let classification = self.classify_message(message);
                METRICS.record_classification(classification.category.label());
                ClassifiedMessage {
                    message: message.clone(),
                    category: classification.to_assigned(),
                }
            })
            .collect()
    }
}

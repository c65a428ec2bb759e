//! Keyword response classifier.
//!
//! Scans the rule table in declared order and returns the first rule whose
//! keywords appear in the message. Falls back to the general-support response.
//! No scoring, no best-match: the crisis rule can never be shadowed by a more
//! specific rule placed after it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::rules::{Category, RuleTable};
use crate::models::Severity;

/// Result of classifying a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Canned reply text of the matched rule
    pub response: String,
    /// Severity of the matched rule
    pub severity: Severity,
    /// Category of the matched rule (`General` for the fallback)
    pub category: Category,
    /// Keyword that triggered the match, `None` for the fallback
    pub matched_keyword: Option<String>,
}

impl Classification {
    pub fn is_fallback(&self) -> bool {
        self.matched_keyword.is_none()
    }
}

/// First-match-wins classifier over a [`RuleTable`].
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: Arc<RuleTable>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    /// Create a classifier over the built-in wellness rules
    pub fn new() -> Self {
        Self::with_table(RuleTable::default())
    }

    pub fn with_table(table: RuleTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Classify a message. Always returns a value.
    pub fn classify(&self, message: &str) -> Classification {
        let lowered = message.to_lowercase();

        for rule in self.table.rules() {
            if let Some(keyword) = rule.matched_keyword(&lowered) {
                if rule.severity().requires_escalation() {
                    warn!(category = %rule.category(), "High severity message detected");
                } else {
                    debug!(category = %rule.category(), keyword, "Rule matched");
                }
                return Classification {
                    response: rule.response().to_string(),
                    severity: rule.severity(),
                    category: rule.category(),
                    matched_keyword: Some(keyword.to_string()),
                };
            }
        }

        let fallback = self.table.fallback();
        debug!("No rule matched, using fallback");
        Classification {
            response: fallback.response().to_string(),
            severity: fallback.severity(),
            category: fallback.category(),
            matched_keyword: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crisis_detection() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("I keep thinking about suicide");
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.category, Category::Crisis);
        assert!(result.response.contains("988"));
    }

    #[test]
    fn test_anxiety_precedes_academic() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("I'm feeling anxious about exams");
        assert_eq!(result.category, Category::Anxiety);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.matched_keyword.as_deref(), Some("anxious"));
    }

    #[test]
    fn test_sleep_detection() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("I can't sleep");
        assert_eq!(result.category, Category::Sleep);
        assert_eq!(result.severity, Severity::Medium);
    }

    #[test]
    fn test_loneliness_is_low() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("Feeling a bit lonely lately");
        assert_eq!(result.category, Category::Loneliness);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn test_fallback() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("The weather is nice today");
        assert!(result.is_fallback());
        assert_eq!(result.category, Category::General);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("INSOMNIA is ruining my week");
        assert_eq!(result.category, Category::Sleep);
    }
}

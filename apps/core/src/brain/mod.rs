//! # Brain Module
//!
//! Fast, rule-based response selection for the wellness chat.
//!
//! ## Components
//! - `rules`: ordered keyword rule table with a trailing fallback
//! - `classifier`: first-match-wins classifier over a rule table

pub mod classifier;
pub mod rules;

pub use classifier::{Classification, KeywordClassifier};
pub use rules::{Category, FallbackRule, ResponseRule, RuleTable, BUILTIN_RULES};

/// Suggested openers a UI can offer before the user has typed anything.
pub const QUICK_PROMPTS: &[&str] = &[
    "Exams are stressing me out",
    "I can't seem to sleep well",
    "Everything feels like too much right now",
    "Feeling a bit lonely lately",
    "Can we talk about managing stress?",
];

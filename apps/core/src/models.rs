use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Urgency attached to a bot reply, driving how a UI styles it.
///
/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Returns the lowercase label for the severity
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Whether a reply of this severity needs escalation styling (warning badge, crisis copy).
    pub fn requires_escalation(&self) -> bool {
        matches!(self, Severity::High)
    }

    /// Badge text shown next to every bot reply carrying a severity.
    pub fn badge(&self) -> String {
        format!("{} priority", self.label())
    }

    /// Banner shown above high-severity replies.
    pub fn escalation_notice(&self) -> Option<&'static str> {
        if self.requires_escalation() {
            Some("Immediate Support Recommended")
        } else {
            None
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Represents a single entry in a chat session.
///
/// Messages are created once and never mutated; a session only ever appends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The unique identifier for the message (UUID).
    pub id: String,
    /// The author of the message.
    pub sender: Sender,
    /// The text content of the message.
    pub text: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Severity of a bot reply. Always `None` for user messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl Message {
    /// Creates a message typed by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text.into(), None)
    }

    /// Creates a bot message, optionally tagged with the severity of the matched rule.
    pub fn bot(text: impl Into<String>, severity: Option<Severity>) -> Self {
        Self::new(Sender::Bot, text.into(), severity)
    }

    fn new(sender: Sender, text: String, severity: Option<Severity>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            text,
            timestamp: Utc::now(),
            severity,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

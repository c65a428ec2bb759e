//! Wellness chat core.
//!
//! A keyword-triggered response classifier and the conversation sessions that
//! drive it. Replies come from a pluggable backend: the local classifier or a
//! remote conversational service.

pub mod actors;
pub mod brain;
pub mod config;
pub mod error;
pub mod models;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use actors::local::LocalBackend;
pub use actors::messages::{SessionEvent, SessionState};
pub use actors::remote::RemoteBackend;
pub use actors::session::{SessionHandle, SessionOptions};
pub use actors::traits::{Reply, ReplyBackend};
pub use brain::{Category, Classification, KeywordClassifier, ResponseRule, RuleTable};
pub use config::{BackendKind, ChatConfig, LogFormat};
pub use error::AppError;
pub use models::{Message, Sender, Severity};

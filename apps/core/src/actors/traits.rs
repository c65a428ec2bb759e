use crate::error::AppError;
use crate::models::Severity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A bot reply produced by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub severity: Option<Severity>,
}

/// Defines the public interface for a reply backend.
///
/// This trait abstracts where replies come from, allowing the local keyword
/// classifier and a remote conversational service to be used interchangeably
/// behind the same severity-driven contract.
#[async_trait]
pub trait ReplyBackend: Send + Sync + 'static {
    /// Produces a reply for a non-blank user message.
    async fn reply(&self, message: &str) -> Result<Reply, AppError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

use crate::actors::traits::{Reply, ReplyBackend};
use crate::brain::KeywordClassifier;
use crate::error::AppError;
use async_trait::async_trait;

/// Replies with the keyword classifier. Never fails.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    classifier: KeywordClassifier,
}

impl LocalBackend {
    pub fn new(classifier: KeywordClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ReplyBackend for LocalBackend {
    async fn reply(&self, message: &str) -> Result<Reply, AppError> {
        let classification = self.classifier.classify(message);
        Ok(Reply {
            text: classification.response,
            severity: Some(classification.severity),
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

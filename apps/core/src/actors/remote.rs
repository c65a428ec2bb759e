use crate::actors::traits::{Reply, ReplyBackend};
use crate::error::AppError;
use crate::models::Severity;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, instrument};
use url::Url;

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyResponse {
    reply: String,
    #[serde(default)]
    urgency: Option<Severity>,
}

/// Replies by calling a remote conversational service.
///
/// Sends `POST <endpoint>` with `{"message": ...}` and expects
/// `{"reply": ..., "urgency": "low" | "medium" | "high" | null}` back.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
    request_timeout: Duration,
}

impl RemoteBackend {
    /// Creates a new remote backend.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Full URL of the reply endpoint.
    /// * `auth_token` - Optional bearer token sent with every request.
    /// * `request_timeout` - Upper bound for one request, including reading the body.
    pub fn new(endpoint: Url, auth_token: Option<String>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            auth_token,
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request(&self, payload: &ReplyRequest<'_>) -> reqwest::RequestBuilder {
        let request = self.client.post(self.endpoint.clone()).json(payload);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_reply(&self, message: &str) -> Result<Reply, AppError> {
        let res = self.build_request(&ReplyRequest { message }).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!(
                "Reply request failed with status {}: {}",
                status, body
            )));
        }

        let body: ReplyResponse = res
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid reply payload: {}", e)))?;

        Ok(Reply {
            text: body.reply,
            severity: body.urgency,
        })
    }
}

#[async_trait]
impl ReplyBackend for RemoteBackend {
    #[instrument(skip(self, message), fields(endpoint = %self.endpoint))]
    async fn reply(&self, message: &str) -> Result<Reply, AppError> {
        info!("Requesting remote reply");
        let result = timeout(self.request_timeout, self.fetch_reply(message)).await?;
        if let Err(e) = &result {
            error!("Remote reply failed: {}", e);
        }
        result
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

use crate::actors::traits::Reply;
use crate::error::AppError;
use crate::models::Message;
use serde::Serialize;
use tokio::sync::oneshot;

/// Whether a session can accept a new submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Ready for the next user message.
    Idle,
    /// A reply is in flight; submissions are rejected.
    AwaitingResponse,
}

/// Events published by a session to its observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was appended to the conversation.
    MessageAppended(Message),
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// The session stopped. No further events follow.
    Stopped,
}

/// Messages that can be sent to the session actor.
#[derive(Debug)]
pub enum SessionMessage {
    /// A request to submit a user message.
    Submit {
        text: String,
        /// A channel to send the appended user message back.
        responder: oneshot::Sender<Result<Message, AppError>>,
    },
    /// A request for a snapshot of the conversation.
    Messages {
        responder: oneshot::Sender<Vec<Message>>,
    },
    /// A request for the current state.
    State {
        responder: oneshot::Sender<SessionState>,
    },
    /// A request to abort the in-flight reply, if any.
    CancelPending {
        /// Sends `true` if a reply was cancelled.
        responder: oneshot::Sender<bool>,
    },
    /// A command to stop the session, aborting any in-flight reply.
    Shutdown,
}

/// Sent by a reply task back to the session actor.
#[derive(Debug)]
pub(crate) struct ReplyCompletion {
    pub turn: u64,
    pub result: Result<Reply, AppError>,
}

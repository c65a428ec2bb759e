use crate::actors::messages::{ReplyCompletion, SessionEvent, SessionMessage, SessionState};
use crate::actors::traits::ReplyBackend;
use crate::error::AppError;
use crate::models::Message;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Default delay before a reply is delivered, simulating typing.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);

/// Bot message that opens every session.
pub const DEFAULT_GREETING: &str = "Hey there! I'm your friendly AI companion, here to listen whenever you need it. Think of me as a safe space to explore your feelings. So, how are you doing today? No pressure to say you're 'fine' if you're not.";

/// Bot message appended when the backend could not produce a reply.
pub const CONNECTION_FAILURE_REPLY: &str = "I'm having trouble connecting right now. Please try again in a moment. If you need to talk to someone immediately, call 988 or your campus crisis line.";

const HANDLE_TIMEOUT: Duration = Duration::from_secs(5);
const EVENT_CAPACITY: usize = 64;

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub reply_delay: Duration,
    pub greeting: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reply_delay: DEFAULT_REPLY_DELAY,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

/// A handle to a session actor.
///
/// This is the entry point for the UI layer. Every handle clone talks to the same
/// conversation. The session stops once all handles are dropped or `shutdown`
/// is called; an in-flight reply is aborted in both cases.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    sender: mpsc::Sender<SessionMessage>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Spawns a session actor backed by `backend` and returns a handle to it.
    ///
    /// The conversation starts with the greeting as its only message.
    pub fn new<B: ReplyBackend>(backend: Arc<B>, options: SessionOptions) -> Self {
        let id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel(32);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let actor = SessionRunner::new(id.clone(), receiver, events.clone(), backend, options);
        tokio::spawn(async move { actor.run().await });
        Self { id, sender, events }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Subscribes to message and state events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Submits a user message.
    ///
    /// Returns the appended user message. The bot reply is appended later and
    /// announced through [`SessionHandle::subscribe`].
    ///
    /// # Errors
    ///
    /// * `AppError::Validation` if the text is blank.
    /// * `AppError::SessionBusy` if a reply is still in flight. The session is left untouched.
    #[instrument(skip(self, text), fields(session_id = %self.id))]
    pub async fn submit_message(&self, text: impl Into<String>) -> Result<Message, AppError> {
        let (send, recv) = oneshot::channel();
        self.send(SessionMessage::Submit {
            text: text.into(),
            responder: send,
        })
        .await?;
        timeout(HANDLE_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))?
    }

    /// Submits a user message and waits for the bot reply.
    ///
    /// Fails with `AppError::Actor` if the reply is cancelled or the session
    /// stops before it arrives.
    pub async fn submit_and_wait(&self, text: impl Into<String>) -> Result<Message, AppError> {
        let mut events = self.subscribe();
        let submitted = self.submit_message(text).await?;

        // Events published before our own message belong to an earlier turn.
        let mut turn_started = false;
        loop {
            match events.recv().await {
                Ok(SessionEvent::MessageAppended(message)) if message.id == submitted.id => {
                    turn_started = true;
                }
                Ok(SessionEvent::MessageAppended(message)) if turn_started && message.is_bot() => {
                    return Ok(message)
                }
                Ok(SessionEvent::StateChanged(SessionState::Idle)) if turn_started => {
                    return Err(AppError::Actor("Reply was cancelled".to_string()))
                }
                Ok(SessionEvent::Stopped) | Err(RecvError::Closed) => {
                    return Err(AppError::Actor("Session stopped".to_string()))
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session event receiver lagged");
                    turn_started = true;
                }
            }
        }
    }

    /// Returns a snapshot of the conversation in append order.
    pub async fn messages(&self) -> Result<Vec<Message>, AppError> {
        let (send, recv) = oneshot::channel();
        self.send(SessionMessage::Messages { responder: send }).await?;
        timeout(HANDLE_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    pub async fn state(&self) -> Result<SessionState, AppError> {
        let (send, recv) = oneshot::channel();
        self.send(SessionMessage::State { responder: send }).await?;
        timeout(HANDLE_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    /// Aborts the in-flight reply. Returns `true` if there was one.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn cancel_pending(&self) -> Result<bool, AppError> {
        let (send, recv) = oneshot::channel();
        self.send(SessionMessage::CancelPending { responder: send })
            .await?;
        timeout(HANDLE_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    /// Stops the session.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.send(SessionMessage::Shutdown).await
    }

    async fn send(&self, msg: SessionMessage) -> Result<(), AppError> {
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))
    }
}

struct PendingTurn {
    turn: u64,
    task: JoinHandle<()>,
}

// --- Actor Runner ---
struct SessionRunner<B: ReplyBackend> {
    id: String,
    receiver: mpsc::Receiver<SessionMessage>,
    completions_tx: mpsc::Sender<ReplyCompletion>,
    completions_rx: mpsc::Receiver<ReplyCompletion>,
    events: broadcast::Sender<SessionEvent>,
    backend: Arc<B>,
    options: SessionOptions,
    messages: Vec<Message>,
    pending: Option<PendingTurn>,
    next_turn: u64,
}

impl<B: ReplyBackend> SessionRunner<B> {
    fn new(
        id: String,
        receiver: mpsc::Receiver<SessionMessage>,
        events: broadcast::Sender<SessionEvent>,
        backend: Arc<B>,
        options: SessionOptions,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(8);
        let greeting = Message::bot(options.greeting.clone(), None);
        Self {
            id,
            receiver,
            completions_tx,
            completions_rx,
            events,
            backend,
            options,
            messages: vec![greeting],
            pending: None,
            next_turn: 0,
        }
    }

    async fn run(mut self) {
        info!(session_id = %self.id, backend = self.backend.name(), "Session started");
        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(SessionMessage::Shutdown) | None => break,
                    Some(msg) => self.handle_message(msg),
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
        }
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            debug!(session_id = %self.id, turn = pending.turn, "Pending reply aborted on stop");
        }
        self.publish(SessionEvent::Stopped);
        info!(session_id = %self.id, "Session stopped");
    }

    fn handle_message(&mut self, msg: SessionMessage) {
        match msg {
            SessionMessage::Submit { text, responder } => {
                let result = self.handle_submit(text);
                let _ = responder.send(result);
            }
            SessionMessage::Messages { responder } => {
                let _ = responder.send(self.messages.clone());
            }
            SessionMessage::State { responder } => {
                let _ = responder.send(self.state());
            }
            SessionMessage::CancelPending { responder } => {
                let _ = responder.send(self.cancel_pending());
            }
            // Handled by the run loop.
            SessionMessage::Shutdown => {}
        }
    }

    fn state(&self) -> SessionState {
        if self.pending.is_some() {
            SessionState::AwaitingResponse
        } else {
            SessionState::Idle
        }
    }

    fn handle_submit(&mut self, text: String) -> Result<Message, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }
        if self.pending.is_some() {
            debug!(session_id = %self.id, "Submission rejected while awaiting a response");
            return Err(AppError::SessionBusy);
        }

        let message = Message::user(text.clone());
        self.append(message.clone());

        let turn = self.next_turn;
        self.next_turn += 1;

        let backend = Arc::clone(&self.backend);
        let completions = self.completions_tx.clone();
        let delay = self.options.reply_delay;
        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let result = backend.reply(&text).await;
            let _ = completions.send(ReplyCompletion { turn, result }).await;
        });

        self.pending = Some(PendingTurn { turn, task });
        self.publish(SessionEvent::StateChanged(SessionState::AwaitingResponse));
        Ok(message)
    }

    fn handle_completion(&mut self, completion: ReplyCompletion) {
        match &self.pending {
            Some(pending) if pending.turn == completion.turn => {}
            _ => {
                debug!(session_id = %self.id, turn = completion.turn, "Discarding stale reply");
                return;
            }
        }
        self.pending = None;

        let reply = match completion.result {
            Ok(reply) => Message::bot(reply.text, reply.severity),
            Err(e) => {
                warn!(session_id = %self.id, "Backend failed to reply: {}", e);
                Message::bot(CONNECTION_FAILURE_REPLY, None)
            }
        };

        if let Some(severity) = reply.severity {
            info!(session_id = %self.id, %severity, "Reply delivered");
        }
        self.append(reply);
        self.publish(SessionEvent::StateChanged(SessionState::Idle));
    }

    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.task.abort();
                info!(session_id = %self.id, turn = pending.turn, "Pending reply cancelled");
                self.publish(SessionEvent::StateChanged(SessionState::Idle));
                true
            }
            None => false,
        }
    }

    fn append(&mut self, message: Message) {
        self.messages.push(message.clone());
        self.publish(SessionEvent::MessageAppended(message));
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::local::LocalBackend;
    use crate::models::{Sender, Severity};

    fn instant_options() -> SessionOptions {
        SessionOptions {
            reply_delay: Duration::ZERO,
            ..SessionOptions::default()
        }
    }

    #[tokio::test]
    async fn test_session_starts_with_greeting() {
        let handle = SessionHandle::new(Arc::new(LocalBackend::default()), instant_options());

        let messages = handle.messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].text, DEFAULT_GREETING);
        assert!(messages[0].severity.is_none());
        assert_eq!(handle.state().await.unwrap(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_blank_submission_rejected() {
        let handle = SessionHandle::new(Arc::new(LocalBackend::default()), instant_options());

        let result = handle.submit_message("   \n\t").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(handle.messages().await.unwrap().len(), 1);
        assert_eq!(handle.state().await.unwrap(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_submit_and_wait_returns_bot_reply() {
        let handle = SessionHandle::new(Arc::new(LocalBackend::default()), instant_options());

        let reply = handle.submit_and_wait("I want to end it all").await.unwrap();
        assert_eq!(reply.severity, Some(Severity::High));
        assert_eq!(handle.state().await.unwrap(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_without_pending_reply() {
        let handle = SessionHandle::new(Arc::new(LocalBackend::default()), instant_options());
        assert!(!handle.cancel_pending().await.unwrap());
    }

    #[tokio::test]
    async fn test_handle_fails_after_shutdown() {
        let handle = SessionHandle::new(Arc::new(LocalBackend::default()), instant_options());
        handle.shutdown().await.unwrap();

        // Give the actor a chance to exit.
        sleep(Duration::from_millis(20)).await;

        let result = handle.messages().await;
        assert!(matches!(result, Err(AppError::Actor(_))));
    }
}

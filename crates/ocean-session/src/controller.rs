//! Session controller: conversation state, the active request and its actions

use std::sync::Arc;

use ocean_reply::{ReplyMode, ReplyProvider};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Error,
    events::SessionEvent,
    message::{self, ERROR_CONTENT, Message, Role, STOPPED_CONTENT, Status},
    store::{self, Store},
};

/// Store key holding the persisted conversation
pub const MESSAGES_KEY: &str = "ocean_chat_messages_v1";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Key the conversation is persisted under
    pub storage_key: String,
    /// System notice seeded into an empty conversation on load
    pub greeting: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: MESSAGES_KEY.to_string(),
            greeting: None,
        }
    }
}

impl SessionConfig {
    /// Default configuration with the greeting matching `mode`
    pub fn for_mode(mode: &ReplyMode) -> Self {
        let greeting = if mode.is_simulated() {
            "You are in mock mode (no backend configured)."
        } else {
            "Connected mode (API base configured)."
        };
        Self {
            greeting: Some(greeting.to_string()),
            ..Self::default()
        }
    }
}

/// How a call to [`SessionController::send`] settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// The reply arrived
    Done,
    /// The request was stopped or superseded
    Canceled,
    /// The request failed with the given description
    Failed(String),
}

/// Read-only snapshot for a presentation layer
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Conversation in display order
    pub messages: Vec<Message>,
    /// Whether a reply is being awaited
    pub is_typing: bool,
    /// Error from the most recent failed turn
    pub error: Option<String>,
    /// Whether `stop()` would cancel something
    pub can_stop: bool,
    /// Whether `retry()` would send something
    pub can_retry: bool,
    /// Most recent user message, if any
    pub last_user_message: Option<Message>,
}

/// The one request allowed in flight
struct ActiveRequest {
    id: u64,
    placeholder_id: String,
    cancel: CancellationToken,
}

#[derive(Default)]
struct SessionState {
    messages: Vec<Message>,
    is_typing: bool,
    error: Option<String>,
    active: Option<ActiveRequest>,
    request_seq: u64,
}

impl SessionState {
    fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }
}

struct Shared {
    state: Mutex<SessionState>,
    provider: Arc<dyn ReplyProvider>,
    store: Arc<dyn Store>,
    storage_key: String,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn persist(&self, state: &SessionState) {
        store::save(self.store.as_ref(), &self.storage_key, &state.messages);
    }

    fn append(&self, state: &mut SessionState, message: Message) {
        state.messages.push(message.clone());
        self.emit(SessionEvent::MessageAppended { message });
    }

    /// Resolve a pending placeholder. One already settled or removed by a reset is skipped.
    fn resolve(&self, state: &mut SessionState, id: &str, content: String, status: Status) {
        if let Some(message) = state
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.is_pending())
        {
            message.content = content;
            message.status = status;
            let message = message.clone();
            self.emit(SessionEvent::MessageUpdated { message });
        }
    }

    fn set_typing(&self, state: &mut SessionState, is_typing: bool) {
        if state.is_typing != is_typing {
            state.is_typing = is_typing;
            self.emit(SessionEvent::TypingChanged { is_typing });
        }
    }

    fn set_error(&self, state: &mut SessionState, error: Option<String>) {
        if state.error != error {
            state.error = error.clone();
            self.emit(SessionEvent::ErrorChanged { error });
        }
    }

    /// Cancel the active request and resolve its placeholder. Returns whether
    /// anything was canceled.
    fn stop(&self, state: &mut SessionState) -> bool {
        let Some(active) = state.active.take() else {
            return false;
        };
        tracing::debug!("Canceling request #{}", active.id);
        active.cancel.cancel();
        self.resolve(
            state,
            &active.placeholder_id,
            STOPPED_CONTENT.to_string(),
            Status::Canceled,
        );
        self.set_typing(state, false);
        true
    }

    fn finish_turn(
        &self,
        placeholder_id: &str,
        request_id: u64,
        cancel: &CancellationToken,
        result: crate::Result<String>,
    ) -> TurnOutcome {
        let mut state = self.state.lock();

        let outcome = match result {
            // A stopped or superseded request never publishes a late result.
            _ if cancel.is_cancelled() => TurnOutcome::Canceled,
            Ok(reply) => {
                self.resolve(&mut state, placeholder_id, reply, Status::Done);
                TurnOutcome::Done
            }
            Err(e) if e.is_canceled() => TurnOutcome::Canceled,
            Err(e) => {
                let description = e.to_string();
                tracing::warn!("Request #{} failed: {}", request_id, description);
                self.set_error(&mut state, Some(description.clone()));
                self.resolve(
                    &mut state,
                    placeholder_id,
                    ERROR_CONTENT.to_string(),
                    Status::Error,
                );
                TurnOutcome::Failed(description)
            }
        };

        if outcome == TurnOutcome::Canceled {
            self.resolve(
                &mut state,
                placeholder_id,
                STOPPED_CONTENT.to_string(),
                Status::Canceled,
            );
        }

        if state.active.as_ref().is_some_and(|a| a.id == request_id) {
            state.active = None;
            self.set_typing(&mut state, false);
        }

        self.persist(&state);
        tracing::debug!("Request #{} settled: {:?}", request_id, outcome);
        outcome
    }
}

/// One turn started by `send`. Dropping it unsettled cancels the request and
/// settles the turn as stopped.
struct Turn {
    shared: Arc<Shared>,
    request_id: u64,
    placeholder_id: String,
    cancel: CancellationToken,
    settled: bool,
}

impl Turn {
    fn finish(mut self, result: crate::Result<String>) -> TurnOutcome {
        self.settled = true;
        self.shared
            .finish_turn(&self.placeholder_id, self.request_id, &self.cancel, result)
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::debug!("Request #{} dropped before settling", self.request_id);
        self.cancel.cancel();
        self.shared.finish_turn(
            &self.placeholder_id,
            self.request_id,
            &self.cancel,
            Err(ocean_reply::Error::Canceled.into()),
        );
    }
}

/// Controller for a single conversation.
///
/// Cloning is cheap and every clone drives the same session, so one clone can
/// `stop()` while another is awaiting `send()`.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    /// Create a controller, loading the persisted conversation from `store`
    pub fn new(
        provider: Arc<dyn ReplyProvider>,
        store: Arc<dyn Store>,
        config: SessionConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);

        let mut messages: Vec<Message> = store::load(store.as_ref(), &config.storage_key, vec![]);
        let mut dirty = false;

        // A placeholder left pending by a previous run has no request behind it.
        for m in messages.iter_mut().filter(|m| m.is_pending()) {
            m.content = STOPPED_CONTENT.to_string();
            m.status = Status::Canceled;
            dirty = true;
        }

        if messages.is_empty() {
            if let Some(greeting) = config.greeting {
                messages.push(Message::system(greeting));
                dirty = true;
            }
        }

        let shared = Shared {
            state: Mutex::new(SessionState {
                messages,
                ..SessionState::default()
            }),
            provider,
            store,
            storage_key: config.storage_key,
            event_tx,
        };
        if dirty {
            shared.persist(&shared.state.lock());
        }

        Self {
            shared: Arc::new(shared),
        }
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Snapshot of the conversation
    pub fn messages(&self) -> Vec<Message> {
        self.shared.state.lock().messages.clone()
    }

    /// Whether a request is in flight
    pub fn is_typing(&self) -> bool {
        self.shared.state.lock().is_typing
    }

    /// The error from the most recent failed turn
    pub fn error(&self) -> Option<String> {
        self.shared.state.lock().error.clone()
    }

    /// Whether `stop()` would cancel something
    pub fn can_stop(&self) -> bool {
        self.shared.state.lock().is_typing
    }

    /// Whether `retry()` would send something
    pub fn can_retry(&self) -> bool {
        let state = self.shared.state.lock();
        state.has_user_message() && !state.is_typing
    }

    /// The most recent user message
    pub fn last_user_message(&self) -> Option<Message> {
        message::last_user_message(&self.shared.state.lock().messages).cloned()
    }

    /// Full read view with derived flags
    pub fn view(&self) -> SessionView {
        let state = self.shared.state.lock();
        SessionView {
            messages: state.messages.clone(),
            is_typing: state.is_typing,
            error: state.error.clone(),
            can_stop: state.is_typing,
            can_retry: state.has_user_message() && !state.is_typing,
            last_user_message: message::last_user_message(&state.messages).cloned(),
        }
    }

    /// Send `text` and wait for its reply.
    ///
    /// Blank input is ignored. Any request already in flight is canceled
    /// first. The turn's placeholder is always resolved before this returns,
    /// and also when the returned future is dropped early.
    pub async fn send(&self, text: &str) -> TurnOutcome {
        let content = text.trim();
        if content.is_empty() {
            return TurnOutcome::Ignored;
        }

        let turn = self.begin_turn(content);
        tracing::debug!("Request #{} started", turn.request_id);

        let result = self
            .shared
            .provider
            .get_reply(content, turn.cancel.clone())
            .await
            .map_err(Error::from);

        turn.finish(result)
    }

    fn begin_turn(&self, content: &str) -> Turn {
        let shared = &self.shared;
        let mut state = shared.state.lock();

        shared.set_error(&mut state, None);
        shared.stop(&mut state);

        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();
        shared.append(&mut state, Message::user(content));
        shared.append(&mut state, placeholder);
        shared.set_typing(&mut state, true);

        state.request_seq += 1;
        let request_id = state.request_seq;
        let cancel = CancellationToken::new();
        state.active = Some(ActiveRequest {
            id: request_id,
            placeholder_id: placeholder_id.clone(),
            cancel: cancel.clone(),
        });

        shared.persist(&state);
        Turn {
            shared: Arc::clone(shared),
            request_id,
            placeholder_id,
            cancel,
            settled: false,
        }
    }

    /// Cancel the in-flight request, if any. Idempotent.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        if self.shared.stop(&mut state) {
            self.shared.persist(&state);
        }
    }

    /// Re-send the content of the most recent user message
    pub async fn retry(&self) -> TurnOutcome {
        match self.last_user_content() {
            Some(content) => self.send(&content).await,
            None => TurnOutcome::Ignored,
        }
    }

    fn last_user_content(&self) -> Option<String> {
        let state = self.shared.state.lock();
        message::last_user_message(&state.messages).map(|m| m.content.clone())
    }

    /// Stop any request, clear the error and discard the conversation
    pub fn reset_conversation(&self) {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        shared.stop(&mut state);
        shared.set_error(&mut state, None);
        state.messages.clear();
        shared.emit(SessionEvent::ConversationCleared);
        shared.persist(&state);
    }

    /// Dismiss the error without touching messages or the active request
    pub fn clear_error(&self) {
        let mut state = self.shared.state.lock();
        self.shared.set_error(&mut state, None);
    }
}

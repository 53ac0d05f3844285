//! Chat client: the transcript plus a single-outstanding-request gate.
//!
//! A turn is committed in two phases. [`ChatClient::begin_query`] appends the
//! user's message and enters `AwaitingResponse`; [`ChatClient::complete_query`]
//! appends exactly one assistant message (the answer or an apology) and
//! returns to `Idle`. [`ChatClient::send_query`] runs both around a backend call.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, QueryReply, SessionBackend};
use crate::session::Session;

pub const WELCOME_MESSAGE_ID: &str = "welcome";
pub const WELCOME_MESSAGE: &str = "Ask me anything about your uploaded data. Example: 'Which supplier had the highest spend?' or 'List purchases by commodity.'";
/// Used when a successful response carries no answer.
pub const NO_RESPONSE_MESSAGE: &str = "No response received.";
/// Substituted for the assistant reply when a turn fails.
pub const FETCH_ERROR_MESSAGE: &str = "Sorry, an error occurred while fetching the answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn welcome() -> Self {
        Self {
            id: WELCOME_MESSAGE_ID.to_string(),
            ..Self::assistant(WELCOME_MESSAGE)
        }
    }
}

/// Append-only, chronologically ordered message list.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Index of the message the view is scrolled to; always the newest.
    scroll_anchor: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Creates a transcript holding only the welcome message.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::welcome()],
            scroll_anchor: 0,
        }
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        self.scroll_anchor = self.messages.len() - 1;
        &self.messages[self.scroll_anchor]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended at or after `index`, for incremental rendering.
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or_default()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn scroll_anchor(&self) -> usize {
        self.scroll_anchor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingResponse,
}

/// A query that has been recorded and must be settled with
/// [`ChatClient::complete_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PendingQuery {
    pub query: String,
    pub room_id: String,
}

/// How a turn's network call settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered(Option<String>),
    Failed(BackendError),
}

impl From<Result<QueryReply, BackendError>> for QueryOutcome {
    fn from(result: Result<QueryReply, BackendError>) -> Self {
        match result {
            Ok(reply) => QueryOutcome::Answered(reply.answer),
            Err(err) => QueryOutcome::Failed(err),
        }
    }
}

/// Key identity as far as commit handling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        Self {
            key: Key::Enter,
            shift: true,
        }
    }

    pub fn is_commit(self) -> bool {
        self.key == Key::Enter && !self.shift
    }
}

/// Whether a key press was consumed by the chat client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Commit key: the draft was offered to `send_query` and the default
    /// action must be suppressed.
    Handled,
    /// Anything else; the caller applies its normal behavior.
    PassThrough,
}

pub struct ChatClient {
    session: Session,
    transcript: Transcript,
    state: ChatState,
    draft: String,
}

impl ChatClient {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            transcript: Transcript::new(),
            state: ChatState::Idle,
            draft: String::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Phase one: records the user's message and enters `AwaitingResponse`.
    ///
    /// Returns `None` (and changes nothing) for blank text or while another
    /// query is outstanding. Calls made while busy are dropped, not queued.
    pub fn begin_query(&mut self, text: &str) -> Option<PendingQuery> {
        if text.trim().is_empty() {
            return None;
        }
        if self.state == ChatState::AwaitingResponse {
            debug!("query ignored while awaiting response");
            return None;
        }

        self.transcript.push(Message::user(text));
        self.state = ChatState::AwaitingResponse;
        Some(PendingQuery {
            query: text.to_string(),
            room_id: self.session.session_id.clone(),
        })
    }

    /// Phase two: appends the assistant's reply (or the apology) and
    /// returns to `Idle`.
    pub fn complete_query(&mut self, outcome: QueryOutcome) -> &Message {
        self.state = ChatState::Idle;
        let content = match outcome {
            QueryOutcome::Answered(answer) => {
                info!(room_id = %self.session.session_id, "answer received");
                answer
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| NO_RESPONSE_MESSAGE.to_string())
            }
            QueryOutcome::Failed(err) => {
                warn!(
                    room_id = %self.session.session_id,
                    kind = %err.kind,
                    error = %err,
                    "query failed"
                );
                FETCH_ERROR_MESSAGE.to_string()
            }
        };
        self.transcript.push(Message::assistant(content))
    }

    /// Runs one full turn. Returns the assistant message, or `None` when the
    /// query was ignored.
    pub async fn send_query<B: SessionBackend>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Option<&Message> {
        let pending = self.begin_query(text)?;
        let outcome: QueryOutcome = backend.query(&pending.room_id, &pending.query).await.into();
        Some(self.complete_query(outcome))
    }

    /// Plain Enter submits the draft; everything else passes through.
    pub async fn handle_key_commit<B: SessionBackend>(
        &mut self,
        backend: &B,
        key: KeyPress,
    ) -> KeyDisposition {
        if !key.is_commit() {
            return KeyDisposition::PassThrough;
        }

        let draft = std::mem::take(&mut self.draft);
        let Some(pending) = self.begin_query(&draft) else {
            // Ignored queries keep the draft for the user to edit.
            self.draft = draft;
            return KeyDisposition::Handled;
        };
        let outcome: QueryOutcome = backend.query(&pending.room_id, &pending.query).await.into();
        self.complete_query(outcome);
        KeyDisposition::Handled
    }
}

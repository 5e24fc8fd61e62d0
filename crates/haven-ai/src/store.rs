//! The session state store.
//!
//! Sole owner of the in-memory transcript, the adopted session reference,
//! and the loading and error slots. Every mutation is a single method call,
//! so callers holding the store's lock never observe intermediate states.

use haven_common::{MessageId, SessionRef};
use tracing::{debug, info, warn};

use crate::frame::Frame;
use crate::message::{Message, Reduction};
use crate::ChatError;

/// Session-level state derived from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No transcript and no session reference.
    Empty,
    /// A transcript exists; the reference is set once the server assigns one.
    Active { session_ref: Option<SessionRef> },
}

/// Result of routing one frame to a message in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Appended,
    Completed { adopted: Option<SessionRef> },
    Ignored,
}

/// Read-only copy of the store for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub messages: Vec<Message>,
    pub session_ref: Option<SessionRef>,
    pub loading: bool,
    pub error: Option<ChatError>,
}

#[derive(Debug)]
pub struct SessionStore {
    messages: Vec<Message>,
    session_ref: Option<SessionRef>,
    loading: bool,
    error: Option<ChatError>,
    next_id: MessageId,
    /// Bumped whenever the transcript is reset or replaced. Work started
    /// under an older generation must not write into the store.
    generation: u64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            session_ref: None,
            loading: false,
            error: None,
            next_id: MessageId::FIRST,
            generation: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn session_ref(&self) -> Option<&SessionRef> {
        self.session_ref.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ChatError> {
        self.error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> SessionPhase {
        if self.messages.is_empty() && self.session_ref.is_none() {
            SessionPhase::Empty
        } else {
            SessionPhase::Active {
                session_ref: self.session_ref.clone(),
            }
        }
    }

    /// The assistant message currently being written, if any.
    pub fn active_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.status.is_active())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            messages: self.messages.clone(),
            session_ref: self.session_ref.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    /// Start of a send: the previous error is dismissed and the loading
    /// flag raised.
    pub fn begin_request(&mut self) {
        self.error = None;
        self.loading = true;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Record a user-facing error and drop the loading flag.
    pub fn raise_error(&mut self, error: ChatError) {
        self.loading = false;
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Append a user message. Returns its id.
    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        let id = self.allocate_id();
        self.messages.push(Message::user(id, content));
        id
    }

    /// Insert the assistant placeholder for a new reply.
    ///
    /// Any message still marked active is failed first, so at most one
    /// assistant message is ever Pending or Streaming.
    pub fn push_placeholder(&mut self) -> MessageId {
        for stale in self.messages.iter_mut().filter(|m| m.status.is_active()) {
            warn!(id = %stale.id, "failing stale active message before new reply");
            stale.fail();
        }
        let id = self.allocate_id();
        self.messages.push(Message::placeholder(id));
        id
    }

    /// Route a frame to message `id`, adopting the session reference from
    /// the first terminal frame that carries one.
    pub fn apply_frame(&mut self, id: MessageId, frame: Frame) -> FrameOutcome {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            debug!(%id, "frame for unknown message dropped");
            return FrameOutcome::Ignored;
        };

        match message.apply(frame) {
            Reduction::Appended => FrameOutcome::Appended,
            Reduction::Ignored => FrameOutcome::Ignored,
            Reduction::Completed { session_ref } => {
                let adopted = session_ref.filter(|candidate| self.adopt_session_ref(candidate));
                FrameOutcome::Completed { adopted }
            }
        }
    }

    /// Adopt `candidate` if no session reference is set yet.
    ///
    /// Returns `true` only when the reference was adopted. An adopted
    /// reference is never replaced.
    pub fn adopt_session_ref(&mut self, candidate: &SessionRef) -> bool {
        match &self.session_ref {
            None => {
                info!(session_ref = %candidate, "session reference adopted");
                self.session_ref = Some(candidate.clone());
                true
            }
            Some(current) if current != candidate => {
                debug!(
                    current = %current,
                    ignored = %candidate,
                    "terminal frame carried a different session reference; keeping current"
                );
                false
            }
            Some(_) => false,
        }
    }

    /// Mark message `id` failed if it has not finished. Returns whether it
    /// changed.
    pub fn fail_message(&mut self, id: MessageId) -> bool {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .is_some_and(|m| m.fail())
    }

    /// Start a new, empty session.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.session_ref = None;
        self.error = None;
        self.loading = false;
        self.next_id = MessageId::FIRST;
        self.generation += 1;
    }

    /// Swap in a stored session wholesale. Message ids are renumbered from 1
    /// in the given order.
    pub fn replace(&mut self, session_ref: SessionRef, messages: Vec<Message>) {
        self.reset();
        for mut message in messages {
            message.id = self.allocate_id();
            self.messages.push(message);
        }
        self.session_ref = Some(session_ref);
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
}

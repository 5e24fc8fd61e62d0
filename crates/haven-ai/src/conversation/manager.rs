//! Conversation struct, store access, and the reset/cancel/error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use haven_common::SessionRef;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::HavenClient;
use crate::credentials::CredentialProvider;
use crate::events::{ConversationEvent, EventBus};
use crate::store::{SessionPhase, SessionStore, StoreSnapshot};
use crate::ChatError;

use super::types::{BusyGuard, ConversationOptions};

/// Owner of one session state store.
///
/// Constructed by the caller and shared by reference (or `Arc`); there is
/// no global instance.
pub struct Conversation {
    pub(super) client: HavenClient,
    pub(super) credentials: Arc<dyn CredentialProvider>,
    pub(super) options: ConversationOptions,
    pub(super) events: EventBus,
    /// Held for the duration of a send or a load.
    busy: AtomicBool,
    store: Mutex<SessionStore>,
    /// Cancellation handle of the operation currently holding `busy`.
    in_flight: Mutex<Option<CancellationToken>>,
}

/// A running send or load: holds the busy flag and publishes its
/// cancellation handle until dropped.
pub(super) struct Operation<'a> {
    _busy: BusyGuard<'a>,
    slot: &'a Mutex<Option<CancellationToken>>,
    pub(super) cancel: CancellationToken,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Conversation {
    pub fn new(
        client: HavenClient,
        credentials: Arc<dyn CredentialProvider>,
        options: ConversationOptions,
    ) -> Self {
        let events = EventBus::new(options.event_capacity);
        Self {
            client,
            credentials,
            options,
            events,
            busy: AtomicBool::new(false),
            store: Mutex::new(SessionStore::new()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &HavenClient {
        &self.client
    }

    pub fn credentials(&self) -> &dyn CredentialProvider {
        self.credentials.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock_store().snapshot()
    }

    pub fn session_ref(&self) -> Option<SessionRef> {
        self.lock_store().session_ref().cloned()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock_store().phase()
    }

    pub fn error(&self) -> Option<ChatError> {
        self.lock_store().error().cloned()
    }

    /// Whether a send or load is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Abort the in-flight send or load, if any. Returns whether there was
    /// one to abort.
    pub fn cancel(&self) -> bool {
        match self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(token) => {
                debug!("cancelling in-flight operation");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Start over with an empty session: aborts anything in flight, then
    /// clears the transcript, session reference, and error in one step.
    pub fn new_session(&self) {
        self.cancel();
        self.lock_store().reset();
        info!("new session started");
        self.events.publish(ConversationEvent::SessionReset);
    }

    /// Dismiss the current error.
    pub fn clear_error(&self) {
        let had_error = {
            let mut store = self.lock_store();
            let had = store.error().is_some();
            store.clear_error();
            had
        };
        if had_error {
            self.events.publish(ConversationEvent::ErrorCleared);
        }
    }

    pub(super) fn begin_operation(&self) -> Result<Operation<'_>, ChatError> {
        let busy = BusyGuard::acquire(&self.busy)?;
        let cancel = CancellationToken::new();
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());
        Ok(Operation {
            _busy: busy,
            slot: &self.in_flight,
            cancel,
        })
    }

    pub(super) fn lock_store(&self) -> MutexGuard<'_, SessionStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the store only if it is still on `generation`.
    /// Work begun before a reset or load must not touch the new transcript.
    pub(super) fn with_store_if<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut SessionStore) -> R,
    ) -> Option<R> {
        let mut store = self.lock_store();
        if store.generation() != generation {
            debug!(
                expected = generation,
                current = store.generation(),
                "dropping stale store update"
            );
            return None;
        }
        Some(f(&mut store))
    }

    /// Put `error` in the store's error slot (if the store is still on
    /// `generation`) and hand it back for returning to the caller.
    pub(super) fn raise(&self, generation: u64, error: ChatError) -> ChatError {
        if self
            .with_store_if(generation, |s| s.raise_error(error.clone()))
            .is_some()
        {
            self.events
                .publish(ConversationEvent::ErrorRaised(error.to_string()));
        }
        error
    }
}

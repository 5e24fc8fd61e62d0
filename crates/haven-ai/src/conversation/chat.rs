//! Sending a prompt and streaming the reply into the store.

use haven_common::{new_correlation_id, MessageId};
use tracing::{debug, info, warn, Instrument};

use crate::client::ExchangeRequest;
use crate::events::ConversationEvent;
use crate::frame::Frame;
use crate::message::Role;
use crate::store::FrameOutcome;
use crate::streaming::{read_frames, StreamEnd};
use crate::ChatError;

use super::manager::Conversation;
use super::types::{is_complex_prompt, SendOptions, SendOutcome};

impl Conversation {
    /// Send `prompt` and stream the reply into the transcript.
    pub async fn send(&self, prompt: &str) -> Result<SendOutcome, ChatError> {
        self.send_with(prompt, SendOptions::default()).await
    }

    /// Send `prompt` with per-send overrides.
    ///
    /// A blank prompt is a no-op. Otherwise the user message is inserted
    /// before the request goes out and stays in the transcript even if the
    /// request fails; the failure lands in the error slot instead.
    pub async fn send_with(
        &self,
        prompt: &str,
        options: SendOptions,
    ) -> Result<SendOutcome, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            debug!("blank prompt ignored");
            return Ok(SendOutcome::Ignored);
        }

        let op = self.begin_operation()?;
        let span = tracing::info_span!("exchange", cid = %new_correlation_id());

        async {
            let is_complex = options
                .complex
                .unwrap_or_else(|| is_complex_prompt(prompt, self.options.complex_prompt_chars));

            let (generation, request) = {
                let mut store = self.lock_store();
                store.begin_request();
                let request = ExchangeRequest::new(
                    prompt,
                    is_complex,
                    store.messages(),
                    store.session_ref().cloned(),
                );
                (store.generation(), request)
            };

            let token = match self.credentials.bearer_token().await {
                Ok(token) => token,
                Err(e) => {
                    warn!("no credential available for send");
                    return Err(self.raise(generation, e));
                }
            };

            if op.cancel.is_cancelled() {
                return Err(self.finish_cancelled(generation, None));
            }

            let Some(user_id) = self.with_store_if(generation, |s| s.push_user(prompt)) else {
                return Err(ChatError::Cancelled);
            };
            self.events.publish(ConversationEvent::MessageAppended {
                id: user_id,
                role: Role::User,
            });

            self.exchange(generation, &request, &token, &op.cancel).await
        }
        .instrument(span)
        .await
    }

    async fn exchange(
        &self,
        generation: u64,
        request: &ExchangeRequest,
        token: &str,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<SendOutcome, ChatError> {
        let stall = self.options.stall_timeout;

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = tokio::time::timeout(stall, self.client.open_exchange(request, token)) => Some(res),
        };
        let response = match opened {
            None => return Err(self.finish_cancelled(generation, None)),
            Some(Err(_)) => {
                let err = ChatError::StallTimeout(stall.as_millis() as u64);
                return Err(self.fail(generation, None, err));
            }
            Some(Ok(Err(e))) => return Err(self.fail(generation, None, e)),
            Some(Ok(Ok(response))) => response,
        };

        let Some(message_id) = self.with_store_if(generation, |s| s.push_placeholder()) else {
            return Err(ChatError::Cancelled);
        };
        self.events.publish(ConversationEvent::MessageAppended {
            id: message_id,
            role: Role::Assistant,
        });

        let mut completed = false;
        let end = read_frames(
            Box::pin(response.bytes_stream()),
            cancel,
            stall,
            |frame| {
                if self.apply_frame(generation, message_id, frame) {
                    completed = true;
                }
            },
        )
        .await;

        if completed {
            if let Err(e) = &end {
                debug!(error = %e, "stream error after terminal frame ignored");
            }
            let session_ref = self
                .with_store_if(generation, |s| s.session_ref().cloned())
                .flatten();
            info!(id = %message_id, "reply complete");
            return Ok(SendOutcome::Completed {
                message_id,
                session_ref,
            });
        }

        match end {
            Ok(StreamEnd::Finished) => {
                warn!(id = %message_id, "stream ended without a terminal frame");
                Err(self.fail(generation, Some(message_id), ChatError::StreamIncomplete))
            }
            Ok(StreamEnd::Cancelled) => Err(self.finish_cancelled(generation, Some(message_id))),
            Err(e) => {
                warn!(id = %message_id, error = %e, "stream failed");
                Err(self.fail(generation, Some(message_id), e))
            }
        }
    }

    /// Apply one frame to the reply. Returns `true` once the reply is
    /// complete.
    fn apply_frame(&self, generation: u64, id: MessageId, frame: Frame) -> bool {
        let delta = match &frame {
            Frame::Delta { text } => Some(text.clone()),
            Frame::Terminal { .. } => None,
        };

        let outcome = self.with_store_if(generation, |s| {
            let outcome = s.apply_frame(id, frame);
            if matches!(outcome, FrameOutcome::Completed { .. }) {
                s.set_loading(false);
            }
            outcome
        });

        match outcome {
            Some(FrameOutcome::Appended) => {
                if let Some(text) = delta {
                    self.events.publish(ConversationEvent::Delta { id, text });
                }
                false
            }
            Some(FrameOutcome::Completed { adopted }) => {
                self.events
                    .publish(ConversationEvent::MessageCompleted { id });
                if let Some(session_ref) = adopted {
                    self.events
                        .publish(ConversationEvent::SessionAdopted(session_ref));
                }
                true
            }
            Some(FrameOutcome::Ignored) | None => false,
        }
    }

    /// Fail the reply (if one was inserted) and surface `error`.
    fn fail(&self, generation: u64, id: Option<MessageId>, error: ChatError) -> ChatError {
        self.fail_reply(generation, id);
        self.raise(generation, error)
    }

    /// Fail the reply (if one was inserted) without touching the error slot.
    fn finish_cancelled(&self, generation: u64, id: Option<MessageId>) -> ChatError {
        self.fail_reply(generation, id);
        self.with_store_if(generation, |s| s.set_loading(false));
        info!("send cancelled");
        ChatError::Cancelled
    }

    fn fail_reply(&self, generation: u64, id: Option<MessageId>) {
        let Some(id) = id else {
            return;
        };
        if self
            .with_store_if(generation, |s| s.fail_message(id))
            .unwrap_or(false)
        {
            self.events.publish(ConversationEvent::MessageFailed { id });
        }
    }
}

//! Chat session state machine.
//!
//! Owns the sidebar, the active conversation, the transcript and the `busy`
//! gate. The view reads through accessors and dispatches intents; it never
//! mutates state directly.
//!
//! Sends are two-phase: [`SessionController::begin_send`] appends the
//! optimistic user message synchronously, [`SessionController::complete_send`]
//! reconciles the server's answer. Anything that replaces the transcript in
//! between bumps an epoch, and the stale completion only releases `busy`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use docchat_client::{ApiError, ChatBackend, ChatRequest};
use docchat_types::{
    Attachment, ChatReply, Conversation, ConversationId, Message, MessageId, SEND_ERROR_MESSAGE,
    SearchResult,
};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A send or transcript load is still in flight.
    #[error("another request is still in flight")]
    Busy,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Api(err) if err.requires_login())
    }
}

/// Why a send was refused before anything changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// Blank text and no attachment.
    Empty,
    Busy,
}

#[derive(Debug)]
pub enum SendOutcome {
    Rejected(SendRejection),
    Delivered {
        /// The server created the conversation for this send.
        started_conversation: bool,
    },
    /// The transcript was replaced while the request was in flight.
    Abandoned { started_conversation: bool },
    /// The error bubble was appended; the user's message stays.
    Failed(ApiError),
}

impl SendOutcome {
    #[must_use]
    pub fn started_conversation(&self) -> bool {
        matches!(
            self,
            Self::Delivered {
                started_conversation: true
            } | Self::Abandoned {
                started_conversation: true
            }
        )
    }

    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Failed(err) if err.requires_login())
    }
}

/// A send whose optimistic message is already in the transcript.
///
/// Owns everything the request needs, so the caller can run it without
/// borrowing the controller.
#[derive(Debug)]
pub struct PendingSend {
    epoch: u64,
    text: String,
    conversation_id: Option<ConversationId>,
    attachment: Option<Attachment>,
}

impl PendingSend {
    #[must_use]
    pub fn request(&self) -> ChatRequest<'_> {
        ChatRequest {
            message: &self.text,
            conversation_id: self.conversation_id.as_ref(),
            attachment: self.attachment.as_ref(),
        }
    }

    /// No conversation was active when the send began.
    #[must_use]
    pub fn is_bootstrap(&self) -> bool {
        self.conversation_id.is_none()
    }
}

/// Millisecond-based ids for optimistic messages, strictly increasing.
#[derive(Debug, Default)]
pub struct LocalIdMinter {
    last: u64,
}

impl LocalIdMinter {
    pub fn mint(&mut self, now: DateTime<Utc>) -> MessageId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.last = millis.max(self.last + 1);
        MessageId::local(self.last)
    }
}

pub struct SessionController<B> {
    backend: B,
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    transcript: Vec<Message>,
    sources: Vec<SearchResult>,
    busy: bool,
    epoch: u64,
    ids: LocalIdMinter,
    clock: Clock,
}

impl<B> std::fmt::Debug for SessionController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("conversations", &self.conversations.len())
            .field("active", &self.active)
            .field("transcript", &self.transcript.len())
            .field("busy", &self.busy)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<B: ChatBackend> SessionController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            conversations: Vec::new(),
            active: None,
            transcript: Vec::new(),
            sources: Vec::new(),
            busy: false,
            epoch: 0,
            ids: LocalIdMinter::default(),
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the clock used for optimistic timestamps and ids.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Retrieved snippets behind the latest answer.
    pub fn sources(&self) -> &[SearchResult] {
        &self.sources
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Replace the sidebar. On failure the previous list stays.
    pub async fn load_conversations(&mut self) -> Result<(), SessionError> {
        match self.backend.list_conversations().await {
            Ok(conversations) => {
                tracing::debug!(count = conversations.len(), "Loaded conversations");
                self.conversations = conversations;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load conversations");
                Err(err.into())
            }
        }
    }

    /// Make `id` active and fetch its transcript. Selecting the active
    /// conversation again refetches it.
    pub async fn select_conversation(&mut self, id: ConversationId) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        self.active = Some(id.clone());
        self.load_transcript(&id).await
    }

    /// Replace the transcript with the server's history for `id`. On failure
    /// the transcript is left empty.
    pub async fn load_transcript(&mut self, id: &ConversationId) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        self.reset_transcript();
        self.busy = true;
        let result = self.backend.get_conversation(id).await;
        self.busy = false;

        match result {
            Ok(detail) => {
                self.transcript = detail.into_messages();
                tracing::debug!(
                    conversation_id = %id,
                    messages = self.transcript.len(),
                    "Loaded transcript"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(conversation_id = %id, error = %err, "Failed to load transcript");
                Err(err.into())
            }
        }
    }

    /// Back to the unselected state. The sidebar is untouched.
    pub fn start_new_chat(&mut self) {
        self.active = None;
        self.reset_transcript();
    }

    /// Validate the send, append the optimistic user message and take `busy`.
    pub fn begin_send(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<PendingSend, SendRejection> {
        if text.trim().is_empty() && attachment.is_none() {
            return Err(SendRejection::Empty);
        }
        if self.busy {
            return Err(SendRejection::Busy);
        }

        let now = (self.clock)();
        let id = self.ids.mint(now);
        let attachment_name = attachment.as_ref().map(|a| a.file_name().to_string());
        self.transcript
            .push(Message::user(id, text, now, attachment_name));
        self.busy = true;

        Ok(PendingSend {
            epoch: self.epoch,
            text: text.to_string(),
            conversation_id: self.active.clone(),
            attachment,
        })
    }

    /// Reconcile the server's answer to `pending`. Always releases `busy`.
    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<ChatReply, ApiError>,
    ) -> SendOutcome {
        self.busy = false;
        let bootstrap = pending.is_bootstrap();

        if pending.epoch != self.epoch {
            let started_conversation = bootstrap && result.is_ok();
            match &result {
                Ok(reply) => tracing::info!(
                    conversation_id = %reply.conversation_id,
                    "Transcript changed while sending; dropping reply"
                ),
                Err(err) => tracing::warn!(error = %err, "Send failed after transcript changed"),
            }
            return SendOutcome::Abandoned {
                started_conversation,
            };
        }

        let now = (self.clock)();
        match result {
            Ok(reply) => {
                if bootstrap {
                    tracing::debug!(conversation_id = %reply.conversation_id, "Server started conversation");
                    self.active = Some(reply.conversation_id);
                }
                let id = self.ids.mint(now);
                self.transcript.push(Message::bot(id, reply.response, now));
                self.sources = reply.search_results;
                SendOutcome::Delivered {
                    started_conversation: bootstrap,
                }
            }
            Err(err) => {
                tracing::warn!(
                    conversation_id = pending.conversation_id.as_ref().map(ConversationId::as_str),
                    error = %err,
                    "Failed to send message"
                );
                let id = self.ids.mint(now);
                self.transcript
                    .push(Message::bot(id, SEND_ERROR_MESSAGE.as_str(), now));
                SendOutcome::Failed(err)
            }
        }
    }

    /// Full send: optimistic append, request, reconcile, and a sidebar refresh
    /// when the server created the conversation.
    pub async fn send_message(&mut self, text: &str, attachment: Option<Attachment>) -> SendOutcome {
        let pending = match self.begin_send(text, attachment) {
            Ok(pending) => pending,
            Err(rejection) => return SendOutcome::Rejected(rejection),
        };

        let result = self.backend.send_chat_message(pending.request()).await;
        let outcome = self.complete_send(pending, result);

        if outcome.started_conversation() {
            // Already logged; the send itself succeeded.
            let _ = self.load_conversations().await;
        }
        outcome
    }

    /// Delete `id` server-side. Deleting the active conversation resets to the
    /// unselected state. On failure nothing changes.
    pub async fn delete_conversation(&mut self, id: &ConversationId) -> Result<(), SessionError> {
        if let Err(err) = self.backend.delete_conversation(id).await {
            tracing::warn!(conversation_id = %id, error = %err, "Failed to delete conversation");
            return Err(err.into());
        }

        tracing::debug!(conversation_id = %id, "Deleted conversation");
        if self.active.as_ref() == Some(id) {
            self.start_new_chat();
        }
        let _ = self.load_conversations().await;
        Ok(())
    }

    fn reset_transcript(&mut self) {
        self.transcript.clear();
        self.sources.clear();
        self.epoch += 1;
    }
}

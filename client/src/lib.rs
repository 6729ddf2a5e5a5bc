//! HTTP client for the docchat backend.
//!
//! # Architecture
//!
//! - [`ApiClient`] - one typed function per backend operation
//! - [`ChatBackend`] - the conversation operations the session controller
//!   depends on; `ApiClient` implements it, tests substitute scripted fakes
//! - [`AuthSession`] - explicit credential holder shared with the front end
//! - [`ClientSettings`] - base URL and timeouts
//!
//! # Endpoints
//!
//! | Operation | Method | Path | Request |
//! |-----------|--------|------|---------|
//! | login | POST | `/auth/login` | form-encoded `username` + `password` |
//! | signup | POST | `/auth/signup` | JSON `{email, password}` |
//! | current user | GET | `/auth/me` | |
//! | list conversations | GET | `/conversations` | |
//! | get conversation | GET | `/conversations/{id}` | |
//! | send message | POST | `/chat` | multipart `message`, `conversation_id?`, `file?` |
//! | delete conversation | DELETE | `/conversations/{id}` | |
//!
//! Every request carries the session's credential as a bearer token when one
//! is present. Missing credentials are not an error here; the auth gate
//! enforces them.
//!
//! # Error Handling
//!
//! Each call is a single request with no retries. Failures come back as
//! [`ApiError`]; nothing panics on a bad response.

mod api;
mod error;
mod session;
mod settings;

use std::future::Future;

pub use api::ApiClient;
pub use error::ApiError;
pub use session::AuthSession;
pub use settings::{ClientSettings, DEFAULT_BASE_URL, InvalidBaseUrl, MIN_CHAT_TIMEOUT};

pub use docchat_types;
pub use reqwest::StatusCode;
use docchat_types::{Attachment, ChatReply, Conversation, ConversationDetail, ConversationId};

/// Payload of a chat send.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    /// `None` asks the server to start a new conversation.
    pub conversation_id: Option<&'a ConversationId>,
    pub attachment: Option<&'a Attachment>,
}

/// Conversation operations consumed by the session controller.
pub trait ChatBackend {
    fn list_conversations(
        &self,
    ) -> impl Future<Output = Result<Vec<Conversation>, ApiError>> + Send;

    fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> impl Future<Output = Result<ConversationDetail, ApiError>> + Send;

    fn send_chat_message(
        &self,
        request: ChatRequest<'_>,
    ) -> impl Future<Output = Result<ChatReply, ApiError>> + Send;

    fn delete_conversation(
        &self,
        id: &ConversationId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

//! Core domain types for docchat.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod attachment;
mod auth;
mod conversation;
mod ids;
mod message;
mod proofs;
mod text;
mod view;

pub use attachment::{Attachment, AttachmentError};
pub use auth::{
    Credential, CurrentUser, EmptyCredentialError, Route, SignupRequest, TokenGrant,
};
pub use conversation::{
    ChatReply, Conversation, ConversationDetail, SearchResult, TITLE_PLACEHOLDER,
};
pub use ids::{ConversationId, MessageId};
pub use message::{Message, Sender, parse_timestamp};
pub use proofs::NonEmptyStaticStr;
pub use text::{first_line, truncate_with_ellipsis};
pub use view::ViewMode;

/// Bot bubble shown when a send fails. The user's own message stays visible.
pub const SEND_ERROR_MESSAGE: NonEmptyStaticStr = NonEmptyStaticStr::new("Error sending message.");

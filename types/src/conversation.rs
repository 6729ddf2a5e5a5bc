use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::ids::ConversationId;
use crate::message::{Message, deserialize_optional_timestamp};
use crate::proofs::NonEmptyStaticStr;

/// Rendered in place of a missing or blank conversation title.
pub const TITLE_PLACEHOLDER: NonEmptyStaticStr = NonEmptyStaticStr::new("New conversation");

/// Sidebar entry for a server-tracked conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    #[must_use]
    pub fn new(id: ConversationId, title: Option<String>) -> Self {
        Self {
            id,
            title,
            created_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The title, or [`TITLE_PLACEHOLDER`] when absent or blank.
    #[must_use]
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => TITLE_PLACEHOLDER.as_str(),
        }
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// A conversation together with its message history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversationDetail {
    id: ConversationId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    messages: Vec<Message>,
}

impl ConversationDetail {
    #[must_use]
    pub fn new(id: ConversationId, title: Option<String>, messages: Vec<Message>) -> Self {
        Self {
            id,
            title,
            messages,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// A knowledge snippet the assistant retrieved while answering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Response to a chat send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub conversation_id: ConversationId,
    pub response: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub search_results: Vec<SearchResult>,
}

impl ChatReply {
    #[must_use]
    pub fn new(conversation_id: ConversationId, response: impl Into<String>) -> Self {
        Self {
            conversation_id,
            response: response.into(),
            search_results: Vec::new(),
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

//! Transcript message model.
//!
//! Constructors take the timestamp explicitly; callers own the clock.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::ids::MessageId;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "assistant")]
    Bot,
}

impl Sender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    attachment: Option<String>,
}

impl Message {
    #[must_use]
    pub fn user(
        id: MessageId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
        attachment: Option<String>,
    ) -> Self {
        Self {
            id,
            sender: Sender::User,
            content: content.into(),
            created_at,
            attachment,
        }
    }

    #[must_use]
    pub fn bot(id: MessageId, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            content: content.into(),
            created_at,
            attachment: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    #[must_use]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// File name of the document sent alongside this message, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a server timestamp.
///
/// Accepts RFC 3339 and the naive ISO forms Python's `datetime` produces
/// (with `T` or a space separator). Naive values are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

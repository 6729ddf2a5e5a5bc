/// Top-level tab of the chat screen.
///
/// Purely presentational: the session controller never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Conversation transcript.
    #[default]
    Ask,
    /// Sources retrieved for the latest answer.
    Knowledge,
}

impl ViewMode {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ask" | "chat" => Some(Self::Ask),
            "knowledge" | "sources" => Some(Self::Knowledge),
            _ => None,
        }
    }

    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Ask => Self::Knowledge,
            Self::Knowledge => Self::Ask,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ask => "Ask",
            Self::Knowledge => "Knowledge",
        }
    }
}

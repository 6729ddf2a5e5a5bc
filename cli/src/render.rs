//! Text rendering of controller state. Pure functions, no IO.

use docchat_session::RedirectReason;
use docchat_types::{
    Conversation, ConversationId, CurrentUser, Message, SearchResult, Sender, ViewMode,
    first_line, truncate_with_ellipsis,
};

const SNIPPET_CHARS: usize = 240;
const TITLE_CHARS: usize = 60;
const CONTINUATION_INDENT: &str = "    ";

pub const LOGIN_HELP: &str = "\
Commands:
  /login <email> <password>    sign in
  /signup <email> <password>   create an account
  /quit                        exit";

pub const CHAT_HELP: &str = "\
Type a message and press Enter to send it.
Commands:
  /list                 show conversations
  /open <n|id>          open a conversation
  /new                  start a new conversation
  /delete <n|id>        delete a conversation
  /attach <path>        attach a PDF to the next message
  /detach               drop the staged attachment
  /tab [ask|knowledge]  switch between the transcript and sources
  /logout               sign out
  /quit                 exit";

#[must_use]
pub fn redirect_notice(reason: RedirectReason) -> &'static str {
    match reason {
        RedirectReason::MissingCredential => "Please log in.",
        RedirectReason::Rejected => "Your session has expired. Please log in again.",
        RedirectReason::Unreachable => {
            "Could not reach the server to check your session. Log in to retry."
        }
    }
}

#[must_use]
pub fn welcome(user: Option<&CurrentUser>, view: ViewMode) -> String {
    match user {
        Some(user) => format!("Signed in as {}. [{}] /help for commands.", user.email, view.label()),
        None => format!("[{}] /help for commands.", view.label()),
    }
}

/// Numbered conversation list with the active one marked.
#[must_use]
pub fn sidebar(conversations: &[Conversation], active: Option<&ConversationId>) -> String {
    if conversations.is_empty() {
        return "No conversations yet.".to_string();
    }

    conversations
        .iter()
        .enumerate()
        .map(|(index, conversation)| {
            let marker = if Some(conversation.id()) == active { '*' } else { ' ' };
            let title = truncate_with_ellipsis(first_line(conversation.display_title()), TITLE_CHARS);
            format!("{marker}[{}] {title}", index + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn bubble(message: &Message) -> String {
    let label = match message.sender() {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    let time = message.created_at().format("%H:%M");

    let mut out = format!("[{time}] {label}:");
    if let Some(name) = message.attachment() {
        out.push_str(&format!(" [attachment: {name}]"));
    }

    let mut lines = message.content().lines();
    if let Some(first) = lines.next() {
        out.push(' ');
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(CONTINUATION_INDENT);
        out.push_str(line);
    }
    out
}

#[must_use]
pub fn transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages. Type below to start.".to_string();
    }
    messages.iter().map(bubble).collect::<Vec<_>>().join("\n")
}

/// The knowledge tab: snippets retrieved for the latest answer.
#[must_use]
pub fn sources(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No sources for the latest answer.".to_string();
    }

    let mut out = String::new();
    for (index, result) in results.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let source = result.source.as_deref().unwrap_or("unknown source");
        out.push_str(&format!("[{}] {source}", index + 1));
        if let Some(score) = result.score {
            out.push_str(&format!(" (score {score:.2})"));
        }
        if let Some(text) = result.text.as_deref() {
            let snippet = truncate_with_ellipsis(&text.replace('\n', " "), SNIPPET_CHARS);
            out.push('\n');
            out.push_str(CONTINUATION_INDENT);
            out.push_str(&snippet);
        }
    }
    out
}

//! Line parsing for the two screens.

use std::path::PathBuf;

use docchat_types::{Conversation, ConversationId, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCommand {
    Login { email: String, password: String },
    Signup { email: String, password: String },
    Help,
    Quit,
    Invalid(String),
}

/// A conversation as typed by the user: a sidebar position or a raw id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Position(usize),
    Id(String),
}

impl Target {
    /// `None` for ids that would collapse out of the request path.
    fn parse(raw: &str) -> Option<Self> {
        if matches!(raw, "" | "." | "..") {
            return None;
        }
        Some(match raw.parse::<usize>() {
            Ok(n) if n > 0 => Self::Position(n),
            _ => Self::Id(raw.to_string()),
        })
    }

    /// Positions shown in the sidebar win; a number past the end, or any
    /// other text, is taken as an id.
    pub fn resolve(&self, sidebar: &[Conversation]) -> ConversationId {
        match self {
            Self::Position(n) => sidebar
                .get(n - 1)
                .map(|c| c.id().clone())
                .unwrap_or_else(|| ConversationId::new(n.to_string())),
            Self::Id(id) => ConversationId::new(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    List,
    Open(Target),
    New,
    Delete(Target),
    Attach(PathBuf),
    Detach,
    /// `None` toggles.
    Tab(Option<ViewMode>),
    Logout,
    Help,
    Quit,
    Send(String),
    Invalid(String),
}

fn split_command(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('/')?;
    Some(match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    })
}

fn credentials(args: &str, usage: &str) -> Result<(String, String), String> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(email), Some(password), None) => Ok((email.to_string(), password.to_string())),
        _ => Err(format!("usage: {usage} <email> <password>")),
    }
}

#[must_use]
pub fn parse_login(line: &str) -> LoginCommand {
    let line = line.trim();
    let Some((name, args)) = split_command(line) else {
        return LoginCommand::Invalid("Log in first: /login <email> <password>".to_string());
    };

    match name {
        "login" => match credentials(args, "/login") {
            Ok((email, password)) => LoginCommand::Login { email, password },
            Err(usage) => LoginCommand::Invalid(usage),
        },
        "signup" => match credentials(args, "/signup") {
            Ok((email, password)) => LoginCommand::Signup { email, password },
            Err(usage) => LoginCommand::Invalid(usage),
        },
        "help" => LoginCommand::Help,
        "quit" | "exit" => LoginCommand::Quit,
        other => LoginCommand::Invalid(format!("Unknown command: /{other}")),
    }
}

/// Anything that is not a slash command is a message, sent untrimmed.
#[must_use]
pub fn parse_chat(line: &str) -> ChatCommand {
    let Some((name, args)) = split_command(line.trim()) else {
        return ChatCommand::Send(line.to_string());
    };

    let needs_arg = |usage: &str, build: fn(&str) -> ChatCommand| {
        if args.is_empty() {
            ChatCommand::Invalid(format!("usage: {usage}"))
        } else {
            build(args)
        }
    };

    match name {
        "list" | "ls" => ChatCommand::List,
        "open" => needs_arg("/open <n|id>", |a| match Target::parse(a) {
            Some(target) => ChatCommand::Open(target),
            None => ChatCommand::Invalid(format!("Not a conversation: {a}")),
        }),
        "new" => ChatCommand::New,
        "delete" | "rm" => needs_arg("/delete <n|id>", |a| match Target::parse(a) {
            Some(target) => ChatCommand::Delete(target),
            None => ChatCommand::Invalid(format!("Not a conversation: {a}")),
        }),
        "attach" => needs_arg("/attach <path>", |a| ChatCommand::Attach(PathBuf::from(a))),
        "detach" => ChatCommand::Detach,
        "tab" if args.is_empty() => ChatCommand::Tab(None),
        "tab" => match ViewMode::parse(args) {
            Some(mode) => ChatCommand::Tab(Some(mode)),
            None => ChatCommand::Invalid("usage: /tab ask|knowledge".to_string()),
        },
        "logout" => ChatCommand::Logout,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        other => ChatCommand::Invalid(format!("Unknown command: /{other}")),
    }
}

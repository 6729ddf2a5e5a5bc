//! docchat - terminal front end.
//!
//! # Architecture
//!
//! ```text
//! main() -> AuthGate::verify -> Mount   -> chat_screen()  -> SessionController
//!                            \-> Redirect -> login_screen() -> gate again
//! ```
//!
//! Both screens read one line at a time from stdin on a current-thread
//! runtime. The chat screen only dispatches intents to the controller and
//! prints what changed; all session state lives in the controller.

mod commands;
mod render;

use std::{
    env,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use docchat_client::{ApiClient, ApiError, AuthSession, ChatBackend, ClientSettings, DEFAULT_BASE_URL};
use docchat_config::{CredentialStore, DocchatConfig};
use docchat_session::{
    AuthGate, GateDecision, RedirectReason, SendOutcome, SendRejection, SessionController,
    SessionError, logout,
};
use docchat_types::{Attachment, Credential, CurrentUser, Route, ViewMode};

use commands::{ChatCommand, LoginCommand, parse_chat, parse_login};

const LOG_ENV: &str = "DOCCHAT_LOG";

fn init_tracing() {
    let env_filter = env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Log lines on stdout would interleave with the transcript; drop them.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!("Failed to create log dir {}: {e}", parent.display()));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!("Failed to open log file {}: {e}", candidate.display()));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.docchat/logs/docchat.log
    if let Some(dir) = docchat_config::data_dir() {
        candidates.push(dir.join("logs").join("docchat.log"));
    }

    // Fallback: ./.docchat/logs/docchat.log
    candidates.push(PathBuf::from(".docchat").join("logs").join("docchat.log"));

    candidates
}

fn client_settings(config: &DocchatConfig) -> Result<ClientSettings> {
    let base_url = config.base_url().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let mut settings = ClientSettings::new(&base_url)?;
    if let Some(timeout) = config.request_timeout() {
        settings = settings.with_request_timeout(timeout);
    }
    if let Some(timeout) = config.chat_timeout() {
        settings = settings.with_chat_timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout() {
        settings = settings.with_connect_timeout(timeout);
    }
    Ok(settings)
}

/// Where screens go when they return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Run the gate again.
    Gate,
    Quit,
}

struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` on end of input.
    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush().context("flush stdout")?;
        self.lines.next_line().await.context("read stdin")
    }
}

/// Shared by both screens.
struct Shell {
    client: ApiClient,
    store: Option<CredentialStore>,
    initial_view: ViewMode,
}

impl Shell {
    fn remember(&self, credential: &Credential) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.save(credential) {
            tracing::warn!(path = %store.path().display(), "Failed to save credential: {e}");
        }
    }

    fn forget(&self) -> Route {
        match &self.store {
            Some(store) => logout(self.client.session(), store),
            None => {
                self.client.session().end();
                Route::Login
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let config = match DocchatConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Ignoring config ({}): {e}", e.path().display());
            DocchatConfig::default()
        }
    };
    let settings = client_settings(&config)?;
    tracing::info!(base_url = %settings.base_url(), "Starting docchat");

    let store = CredentialStore::open_default();
    let session = AuthSession::new();
    if let Some(store) = &store {
        match store.load() {
            Ok(Some(credential)) => session.begin(credential),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %store.path().display(), "Failed to read stored credential: {e}");
            }
        }
    }

    let shell = Shell {
        client: ApiClient::new(settings, session)?,
        store,
        initial_view: config.view_mode(),
    };
    let mut console = Console::new();

    loop {
        let exit = match AuthGate::verify(&shell.client).await {
            GateDecision::Mount(user) => chat_screen(&shell, &mut console, user).await?,
            GateDecision::Redirect { reason, .. } => {
                if reason == RedirectReason::Rejected {
                    shell.forget();
                }
                println!("{}", render::redirect_notice(reason));
                login_screen(&shell, &mut console).await?
            }
        };
        if exit == Exit::Quit {
            break;
        }
    }

    tracing::info!("Exiting");
    Ok(())
}

async fn login_screen(shell: &Shell, console: &mut Console) -> Result<Exit> {
    loop {
        let Some(line) = console.prompt("login> ").await? else {
            return Ok(Exit::Quit);
        };

        let result = match parse_login(&line) {
            LoginCommand::Login { email, password } => shell.client.login(&email, &password).await,
            LoginCommand::Signup { email, password } => {
                shell.client.signup(&email, &password).await
            }
            LoginCommand::Help => {
                println!("{}", render::LOGIN_HELP);
                continue;
            }
            LoginCommand::Quit => return Ok(Exit::Quit),
            LoginCommand::Invalid(message) => {
                println!("{message}");
                continue;
            }
        };

        match result {
            Ok(credential) => {
                shell.remember(&credential);
                shell.client.session().begin(credential);
                return Ok(Exit::Gate);
            }
            Err(err) if err.requires_login() => {
                println!("{}", err.detail().unwrap_or("Invalid email or password."));
            }
            Err(err) => println!("{}", describe_api_error(&err)),
        }
    }
}

fn describe_api_error(err: &ApiError) -> String {
    if err.is_timeout() {
        return "The server took too long to answer.".to_string();
    }
    match err.detail() {
        Some(detail) => format!("Request failed: {detail}"),
        None => format!("Request failed: {err}"),
    }
}

async fn chat_screen(
    shell: &Shell,
    console: &mut Console,
    user: Option<CurrentUser>,
) -> Result<Exit> {
    let mut controller = SessionController::new(shell.client.clone());
    let mut view = shell.initial_view;
    let mut staged: Option<Attachment> = None;

    println!("{}", render::welcome(user.as_ref(), view));
    if let Err(err) = controller.load_conversations().await {
        if err.requires_login() {
            return Ok(escalate(shell));
        }
        println!("Could not load conversations.");
    }
    println!("{}", render::sidebar(controller.conversations(), None));

    loop {
        let prompt = match &staged {
            Some(attachment) => format!("[{}] > ", attachment.file_name()),
            None => "> ".to_string(),
        };
        let Some(line) = console.prompt(&prompt).await? else {
            return Ok(Exit::Quit);
        };

        let result = match parse_chat(&line) {
            ChatCommand::Send(text) => {
                if controller.is_busy() {
                    println!("Still waiting for the previous answer.");
                    continue;
                }
                let before = controller.transcript().len();
                let outcome = controller.send_message(&text, staged.take()).await;
                match &outcome {
                    SendOutcome::Rejected(SendRejection::Empty) => {}
                    SendOutcome::Rejected(SendRejection::Busy) => {
                        println!("Still waiting for the previous answer.");
                    }
                    SendOutcome::Abandoned { .. } => {}
                    SendOutcome::Delivered { .. } | SendOutcome::Failed(_) => {
                        // The user's own line is already on screen.
                        for message in controller.transcript().iter().skip(before + 1) {
                            println!("{}", render::bubble(message));
                        }
                        if view == ViewMode::Knowledge {
                            println!("{}", render::sources(controller.sources()));
                        }
                    }
                }
                if outcome.requires_login() {
                    return Ok(escalate(shell));
                }
                Ok(())
            }
            ChatCommand::List => {
                let result = controller.load_conversations().await;
                println!(
                    "{}",
                    render::sidebar(controller.conversations(), controller.active_conversation())
                );
                result
            }
            ChatCommand::Open(target) => {
                let id = target.resolve(controller.conversations());
                let result = controller.select_conversation(id).await;
                if result.is_ok() {
                    print_view(&controller, view);
                }
                result
            }
            ChatCommand::New => {
                controller.start_new_chat();
                println!("New conversation.");
                Ok(())
            }
            ChatCommand::Delete(target) => {
                let id = target.resolve(controller.conversations());
                let result = controller.delete_conversation(&id).await;
                if result.is_ok() {
                    println!("Deleted.");
                    println!(
                        "{}",
                        render::sidebar(
                            controller.conversations(),
                            controller.active_conversation()
                        )
                    );
                }
                result
            }
            ChatCommand::Attach(path) => {
                match read_attachment(&path).await {
                    Ok(attachment) => {
                        println!("Attached {} ({} bytes).", attachment.file_name(), attachment.len());
                        staged = Some(attachment);
                    }
                    Err(message) => println!("{message}"),
                }
                Ok(())
            }
            ChatCommand::Detach => {
                if staged.take().is_some() {
                    println!("Attachment removed.");
                }
                Ok(())
            }
            ChatCommand::Tab(mode) => {
                view = mode.unwrap_or_else(|| view.toggle());
                print_view(&controller, view);
                Ok(())
            }
            ChatCommand::Logout => {
                shell.forget();
                println!("Logged out.");
                return Ok(Exit::Gate);
            }
            ChatCommand::Help => {
                println!("{}", render::CHAT_HELP);
                Ok(())
            }
            ChatCommand::Quit => return Ok(Exit::Quit),
            ChatCommand::Invalid(message) => {
                println!("{message}");
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.requires_login() => return Ok(escalate(shell)),
            Err(SessionError::Busy) => println!("Still waiting for the previous request."),
            Err(SessionError::Api(err)) => println!("{}", describe_api_error(&err)),
        }
    }
}

fn print_view<B: ChatBackend>(controller: &SessionController<B>, view: ViewMode) {
    match view {
        ViewMode::Ask => println!("{}", render::transcript(controller.transcript())),
        ViewMode::Knowledge => println!("{}", render::sources(controller.sources())),
    }
}

/// Auth failure mid-session: drop the credential and go back through the gate.
fn escalate(shell: &Shell) -> Exit {
    tracing::warn!("Credential rejected during chat; returning to login");
    shell.forget();
    Exit::Gate
}

async fn read_attachment(path: &Path) -> Result<Attachment, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Could not read {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Attachment::pdf(name, bytes).map_err(|e| e.to_string())
}

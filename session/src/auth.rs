//! Gate in front of the chat screen.
//!
//! [`AuthGate::check`] looks only at credential presence. [`AuthGate::verify`]
//! additionally asks the server who the credential belongs to, which is where
//! an expired token is discovered.

use docchat_client::{ApiClient, AuthSession};
use docchat_config::CredentialStore;
use docchat_types::{CurrentUser, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingCredential,
    /// The server refused the credential; it has been dropped.
    Rejected,
    /// The server could not confirm the credential; it is kept.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Mount the chat screen. The user is known only after [`AuthGate::verify`].
    Mount(Option<CurrentUser>),
    Redirect { to: Route, reason: RedirectReason },
}

impl GateDecision {
    #[must_use]
    pub fn route(&self) -> Route {
        match self {
            Self::Mount(_) => Route::Chat,
            Self::Redirect { to, .. } => *to,
        }
    }

    #[must_use]
    pub fn is_mount(&self) -> bool {
        matches!(self, Self::Mount(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthGate;

impl AuthGate {
    #[must_use]
    pub fn check(session: &AuthSession) -> GateDecision {
        if session.is_authenticated() {
            GateDecision::Mount(None)
        } else {
            GateDecision::Redirect {
                to: Route::Login,
                reason: RedirectReason::MissingCredential,
            }
        }
    }

    pub async fn verify(client: &ApiClient) -> GateDecision {
        let presence = Self::check(client.session());
        if !presence.is_mount() {
            return presence;
        }

        match client.get_current_user().await {
            Ok(user) => {
                tracing::info!(email = %user.email, "Credential verified");
                GateDecision::Mount(Some(user))
            }
            Err(err) if err.requires_login() => {
                tracing::warn!(error = %err, "Credential rejected; ending session");
                client.session().end();
                GateDecision::Redirect {
                    to: Route::Login,
                    reason: RedirectReason::Rejected,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not verify credential");
                GateDecision::Redirect {
                    to: Route::Login,
                    reason: RedirectReason::Unreachable,
                }
            }
        }
    }
}

/// End the session, forget the stored credential and go to the login screen.
pub fn logout(session: &AuthSession, store: &CredentialStore) -> Route {
    session.end();
    if let Err(e) = store.clear() {
        tracing::warn!(path = %store.path().display(), "Failed to remove stored credential: {e}");
    }
    Route::Login
}

use std::sync::{Arc, PoisonError, RwLock};

use docchat_types::Credential;

/// Process-wide holder of the bearer credential.
///
/// Cloning shares the same slot: the front end begins and ends the session, and
/// every [`ApiClient`](crate::ApiClient) built from a clone reads the current
/// credential on each request.
#[derive(Clone, Default)]
pub struct AuthSession {
    slot: Arc<RwLock<Option<Credential>>>,
}

impl AuthSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(credential))),
        }
    }

    /// Install the credential obtained at login.
    pub fn begin(&self, credential: Credential) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
        tracing::debug!("Auth session started");
    }

    /// Drop the credential. Returns whether one was present.
    pub fn end(&self) -> bool {
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::debug!(had_credential = previous.is_some(), "Auth session ended");
        previous.is_some()
    }

    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

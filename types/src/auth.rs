use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bearer token proving an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

#[derive(Debug, Error)]
#[error("credential must not be empty")]
pub struct EmptyCredentialError;

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self, EmptyCredentialError> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(EmptyCredentialError);
        }
        if trimmed.len() == token.len() {
            Ok(Self(token))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// The raw token. Only request construction and the credential store should
    /// need this.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Manual Debug impl to prevent leaking tokens in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(<redacted>)")
    }
}

/// Token payload returned by login and signup.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenGrant {
    pub fn into_credential(self) -> Result<Credential, EmptyCredentialError> {
        Credential::new(self.access_token)
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Signup request body.
#[derive(Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub email: String,
}

/// Screens the front end can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Chat,
}

#[cfg(test)]
mod tests {
    use super::{Credential, TokenGrant};

    #[test]
    fn debug_output_is_redacted() {
        let credential = Credential::new("secret-token").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret-token"));
        assert_eq!(credential.expose(), "secret-token");
    }

    #[test]
    fn blank_credential_is_rejected() {
        assert!(Credential::new("").is_err());
        assert!(Credential::new(" \n").is_err());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let credential = Credential::new("tok\n").unwrap();
        assert_eq!(credential.expose(), "tok");
    }

    #[test]
    fn token_grant_decodes_oauth_payload() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{"access_token": "abc", "token_type": "bearer"}"#).unwrap();
        assert_eq!(grant.token_type.as_deref(), Some("bearer"));
        assert!(!format!("{grant:?}").contains("abc"));
        assert_eq!(grant.into_credential().unwrap().expose(), "abc");
    }
}

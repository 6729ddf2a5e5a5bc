//! Failure taxonomy for backend calls.
//!
//! Transport failures, authentication failures and other HTTP failures are kept
//! apart because callers react differently: an auth failure sends the user back
//! to the login screen, everything else is reported in place.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use docchat_types::truncate_with_ellipsis;

const MAX_DETAIL_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Connect, timeout or IO failure. The server may never have seen the request.
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// Missing, expired or rejected credential.
    #[error("{operation}: not authorized ({status}): {detail}")]
    Unauthorized {
        operation: &'static str,
        status: StatusCode,
        detail: String,
    },
    #[error("{operation}: API error {status}: {detail}")]
    Http {
        operation: &'static str,
        status: StatusCode,
        detail: String,
    },
    /// A success response whose body does not match the contract.
    #[error("{operation}: unexpected response body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{operation}: response did not contain an access token")]
    MissingToken { operation: &'static str },
    #[error("{operation}: could not build request: {source}")]
    Build {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Classify a non-success response.
    pub(crate) fn from_status(operation: &'static str, status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("no details").to_string());
        if matches!(status.as_u16(), 401 | 403) {
            Self::Unauthorized {
                operation,
                status,
                detail,
            }
        } else {
            Self::Http {
                operation,
                status,
                detail,
            }
        }
    }

    /// Login answers bad credentials with 400 as well as 401.
    pub(crate) fn into_login_failure(self) -> Self {
        match self {
            Self::Http {
                operation,
                status,
                detail,
            } if status == StatusCode::BAD_REQUEST => Self::Unauthorized {
                operation,
                status,
                detail,
            },
            other => other,
        }
    }

    /// Whether no further request can succeed until the user logs in again.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. }
            | Self::Unauthorized { operation, .. }
            | Self::Http { operation, .. }
            | Self::Decode { operation, .. }
            | Self::MissingToken { operation }
            | Self::Build { operation, .. } => *operation,
        }
    }

    /// Server-provided explanation, when the server gave one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { detail, .. } | Self::Http { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands FastAPI's `{"detail": "..."}` and `{"detail": [{"msg": ...}]}`
/// shapes plus the common `{"error": {"message": ...}}` / `{"message": ...}`
/// envelopes. Non-JSON bodies are returned as-is (truncated).
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let extracted = serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|payload| {
            payload
                .get("detail")
                .and_then(detail_text)
                .or_else(|| {
                    payload
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
                .or_else(|| {
                    payload
                        .get("message")
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
        });

    let detail = extracted.unwrap_or_else(|| trimmed.to_string());
    Some(truncate_with_ellipsis(&detail, MAX_DETAIL_CHARS))
}

fn detail_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{ApiError, extract_detail};

    #[test]
    fn extracts_fastapi_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "Conversation not found"}"#).as_deref(),
            Some("Conversation not found")
        );
    }

    #[test]
    fn joins_validation_messages() {
        let body = r#"{"detail": [{"loc": ["body", "message"], "msg": "field required"}, {"msg": "value too long"}]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("field required; value too long")
        );
    }

    #[test]
    fn falls_back_to_other_envelopes() {
        assert_eq!(
            extract_detail(r#"{"error": {"message": "rate limited"}}"#).as_deref(),
            Some("rate limited")
        );
        assert_eq!(
            extract_detail(r#"{"message": "down for maintenance"}"#).as_deref(),
            Some("down for maintenance")
        );
    }

    #[test]
    fn plain_text_bodies_pass_through() {
        assert_eq!(
            extract_detail("  Bad Gateway  ").as_deref(),
            Some("Bad Gateway")
        );
        assert_eq!(extract_detail("   "), None);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(5_000);
        let detail = extract_detail(&body).unwrap();
        assert_eq!(detail.chars().count(), 300);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn auth_statuses_require_login() {
        let unauthorized = ApiError::from_status("me", StatusCode::UNAUTHORIZED, "");
        let forbidden = ApiError::from_status("me", StatusCode::FORBIDDEN, "{}");
        let missing = ApiError::from_status("get", StatusCode::NOT_FOUND, "");
        assert!(unauthorized.requires_login());
        assert!(forbidden.requires_login());
        assert!(!missing.requires_login());
        assert_eq!(unauthorized.detail(), Some("Unauthorized"));
        assert_eq!(missing.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn login_bad_request_becomes_unauthorized() {
        let err = ApiError::from_status(
            "login",
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Incorrect username or password"}"#,
        )
        .into_login_failure();
        assert!(err.requires_login());
        assert_eq!(err.detail(), Some("Incorrect username or password"));

        let server = ApiError::from_status("login", StatusCode::INTERNAL_SERVER_ERROR, "")
            .into_login_failure();
        assert!(!server.requires_login());
    }
}

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use docchat_types::{
    Attachment, ChatReply, Conversation, ConversationDetail, ConversationId, Credential,
    CurrentUser, SignupRequest, TokenGrant,
};

use crate::{ApiError, AuthSession, ChatBackend, ChatRequest, ClientSettings};

const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 8;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_REDIRECTS: usize = 5;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

const LOGIN: &str = "login";
const SIGNUP: &str = "signup";
const CURRENT_USER: &str = "current_user";
const LIST_CONVERSATIONS: &str = "list_conversations";
const GET_CONVERSATION: &str = "get_conversation";
const SEND_MESSAGE: &str = "send_message";
const DELETE_CONVERSATION: &str = "delete_conversation";

fn base_client_builder(settings: &ClientSettings) -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("docchat/", env!("CARGO_PKG_VERSION"))),
    );
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout())
        .timeout(settings.request_timeout())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// Read at most [`MAX_ERROR_BODY_BYTES`] of an error response.
async fn read_capped_error_body(mut response: Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Typed client for the docchat backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: ClientSettings,
    session: AuthSession,
}

impl ApiClient {
    pub fn new(settings: ClientSettings, session: AuthSession) -> Result<Self, ApiError> {
        let http = base_client_builder(&settings)
            .build()
            .map_err(|source| ApiError::Build {
                operation: "client",
                source,
            })?;
        Ok(Self {
            http,
            settings,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Exchange email and password for a credential.
    ///
    /// Rejected credentials come back as [`ApiError::Unauthorized`]. The
    /// session is left untouched; the caller decides whether to begin it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ApiError> {
        // OAuth2 password flow: the email travels as `username`.
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", email)
            .append_pair("password", password)
            .finish();
        let request = self
            .http
            .post(self.settings.endpoint(&["auth", "login"]))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);

        let response = self
            .execute(LOGIN, request)
            .await
            .map_err(ApiError::into_login_failure)?;
        let grant: TokenGrant = decode(LOGIN, response).await?;
        grant
            .into_credential()
            .map_err(|_| ApiError::MissingToken { operation: LOGIN })
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<Credential, ApiError> {
        let request = self
            .http
            .post(self.settings.endpoint(&["auth", "signup"]))
            .json(&SignupRequest { email, password });

        let response = self.execute(SIGNUP, request).await?;
        let grant: TokenGrant = decode(SIGNUP, response).await?;
        grant
            .into_credential()
            .map_err(|_| ApiError::MissingToken { operation: SIGNUP })
    }

    /// Resolve the current credential to a user. This is where an expired or
    /// revoked credential is discovered.
    pub async fn get_current_user(&self) -> Result<CurrentUser, ApiError> {
        let request = self.http.get(self.settings.endpoint(&["auth", "me"]));
        let response = self.execute(CURRENT_USER, request).await?;
        decode(CURRENT_USER, response).await
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let request = match self.session.credential() {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        };

        let request = request
            .build()
            .map_err(|source| ApiError::Build { operation, source })?;
        tracing::debug!(
            operation,
            method = %request.method(),
            endpoint = %request.url(),
            "Sending request"
        );
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(operation, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        tracing::debug!(operation, status = status.as_u16(), "Request failed");
        let body = read_capped_error_body(response).await;
        Err(ApiError::from_status(operation, status, &body))
    }

    fn chat_form(request: &ChatRequest<'_>) -> Result<Form, ApiError> {
        let mut form = Form::new().text("message", request.message.to_string());
        if let Some(id) = request.conversation_id {
            form = form.text("conversation_id", id.as_str().to_string());
        }
        if let Some(attachment) = request.attachment {
            let part = Part::bytes(attachment.bytes().to_vec())
                .file_name(attachment.file_name().to_string())
                .mime_str(Attachment::MIME_TYPE)
                .map_err(|source| ApiError::Build {
                    operation: SEND_MESSAGE,
                    source,
                })?;
            form = form.part("file", part);
        }
        Ok(form)
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport { operation, source })?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { operation, source })
}

impl ChatBackend for ApiClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let request = self.http.get(self.settings.endpoint(&["conversations"]));
        let response = self.execute(LIST_CONVERSATIONS, request).await?;
        decode(LIST_CONVERSATIONS, response).await
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<ConversationDetail, ApiError> {
        let request = self
            .http
            .get(self.settings.endpoint(&["conversations", id.as_str()]));
        let response = self.execute(GET_CONVERSATION, request).await?;
        decode(GET_CONVERSATION, response).await
    }

    async fn send_chat_message(&self, request: ChatRequest<'_>) -> Result<ChatReply, ApiError> {
        let form = Self::chat_form(&request)?;
        let builder = self
            .http
            .post(self.settings.endpoint(&["chat"]))
            .timeout(self.settings.chat_timeout())
            .multipart(form);

        tracing::debug!(
            new_conversation = request.conversation_id.is_none(),
            attachment = request.attachment.map(Attachment::file_name),
            "Sending chat message"
        );
        let response = self.execute(SEND_MESSAGE, builder).await?;
        decode(SEND_MESSAGE, response).await
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.settings.endpoint(&["conversations", id.as_str()]));
        // The acknowledgement body carries nothing the caller needs.
        self.execute(DELETE_CONVERSATION, request).await?;
        Ok(())
    }
}

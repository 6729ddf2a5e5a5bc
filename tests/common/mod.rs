//! Shared test utilities and fixtures
//!
//! A wiremock stand-in for the docchat backend, mounted under `/api`.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docchat_client::{ApiClient, AuthSession, ClientSettings};
use docchat_types::Credential;

pub const TOKEN: &str = "test-token";

pub async fn start_backend() -> MockServer {
    MockServer::start().await
}

pub fn client(server: &MockServer, session: AuthSession) -> ApiClient {
    let settings = ClientSettings::new(&format!("{}/api", server.uri())).unwrap();
    ApiClient::new(settings, session).unwrap()
}

pub fn signed_in_session() -> AuthSession {
    AuthSession::with_credential(Credential::new(TOKEN).unwrap())
}

fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": token, "token_type": "bearer"})),
        )
        .mount(server)
        .await;
}

pub async fn mount_current_user(server: &MockServer, email: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": email})))
        .mount(server)
        .await;
}

pub async fn mount_current_user_rejected(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(server)
        .await;
}

/// Conversations as the backend lists them: `(id, title)`.
pub async fn mount_conversations(server: &MockServer, conversations: &[(i64, &str)]) {
    let body: Vec<Value> = conversations
        .iter()
        .map(|(id, title)| {
            json!({
                "id": id,
                "title": title,
                "created_at": "2024-05-01T10:00:00",
                "messages": []
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(body)))
        .mount(server)
        .await;
}

/// A conversation whose history alternates user and bot messages.
pub async fn mount_conversation(server: &MockServer, id: i64, exchanges: &[(&str, &str)]) {
    let mut messages = Vec::new();
    for (index, (question, answer)) in exchanges.iter().enumerate() {
        let base = index as i64 * 2;
        messages.push(json!({
            "id": base + 1,
            "sender": "user",
            "content": question,
            "created_at": "2024-05-01T10:00:00.123456"
        }));
        messages.push(json!({
            "id": base + 2,
            "sender": "bot",
            "content": answer,
            "created_at": "2024-05-01T10:00:05.654321"
        }));
    }

    Mock::given(method("GET"))
        .and(path(format!("/api/conversations/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "title": "Loaded",
            "created_at": "2024-05-01T10:00:00",
            "messages": messages
        })))
        .mount(server)
        .await;
}

pub async fn mount_chat_reply(server: &MockServer, conversation_id: i64, response: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": response,
            "conversation_id": conversation_id,
            "search_results": [
                {"text": "Invoice total: 40 EUR", "source": "invoice.pdf", "score": 0.87}
            ]
        })))
        .mount(server)
        .await;
}

pub async fn mount_chat_failure(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({"detail": "Error processing file"})),
        )
        .mount(server)
        .await;
}

pub async fn mount_delete(server: &MockServer, id: i64) {
    Mock::given(method("DELETE"))
        .and(path(format!("/api/conversations/{id}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Conversation deleted"})),
        )
        .mount(server)
        .await;
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n".to_vec()
}

//! Session controller driving the real HTTP client

use docchat_client::ChatBackend;
use docchat_session::{SendOutcome, SessionController};
use docchat_types::{Attachment, ConversationId, Sender};

use crate::common::{
    client, mount_chat_failure, mount_chat_reply, mount_conversation, mount_conversations,
    mount_delete, pdf_bytes, signed_in_session, start_backend,
};

#[tokio::test]
async fn first_message_creates_conversation_and_refreshes_sidebar() {
    let server = start_backend().await;
    mount_chat_reply(&server, 12, "Hello!").await;
    mount_conversations(&server, &[(12, "Hi")]).await;

    let mut controller = SessionController::new(client(&server, signed_in_session()));
    let outcome = controller.send_message("Hi", None).await;

    assert!(matches!(
        outcome,
        SendOutcome::Delivered {
            started_conversation: true
        }
    ));
    assert_eq!(controller.active_conversation(), Some(&ConversationId::from("12")));
    let transcript: Vec<(Sender, &str)> = controller
        .transcript()
        .iter()
        .map(|m| (m.sender(), m.content()))
        .collect();
    assert_eq!(transcript, vec![(Sender::User, "Hi"), (Sender::Bot, "Hello!")]);
    assert_eq!(controller.conversations().len(), 1);
    assert_eq!(controller.conversations()[0].id(), &ConversationId::from("12"));
    assert_eq!(controller.sources().len(), 1);

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/api/chat", "/api/conversations"]);
}

#[tokio::test]
async fn follow_up_carries_conversation_id() {
    let server = start_backend().await;
    mount_conversation(&server, 5, &[("Hi", "Hello!")]).await;
    mount_chat_reply(&server, 5, "Sure.").await;

    let mut controller = SessionController::new(client(&server, signed_in_session()));
    controller
        .select_conversation(ConversationId::from("5"))
        .await
        .unwrap();
    assert_eq!(controller.transcript().len(), 2);

    controller.send_message("And page two?", None).await;
    assert_eq!(controller.transcript().len(), 4);

    let requests = server.received_requests().await.unwrap();
    let chat = requests.iter().find(|r| r.url.path() == "/api/chat").unwrap();
    let body = String::from_utf8_lossy(&chat.body);
    assert!(body.contains("name=\"conversation_id\""));
    assert!(body.contains("And page two?"));
    // No refresh for an existing conversation.
    assert!(!requests.iter().any(|r| r.url.path() == "/api/conversations"));
}

#[tokio::test]
async fn failed_upload_keeps_question_visible() {
    let server = start_backend().await;
    mount_chat_failure(&server, 500).await;

    let mut controller = SessionController::new(client(&server, signed_in_session()));
    let attachment = Attachment::pdf("invoice.pdf", pdf_bytes()).unwrap();
    let outcome = controller
        .send_message("What does this say?", Some(attachment))
        .await;

    assert!(matches!(outcome, SendOutcome::Failed(_)));
    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].attachment(), Some("invoice.pdf"));
    assert_eq!(transcript[1].sender(), Sender::Bot);
    assert_eq!(transcript[1].content(), "Error sending message.");
    assert!(controller.active_conversation().is_none());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn unauthorized_send_asks_for_login() {
    let server = start_backend().await;
    mount_chat_failure(&server, 401).await;

    let mut controller = SessionController::new(client(&server, signed_in_session()));
    let outcome = controller.send_message("Hi", None).await;
    assert!(outcome.requires_login());
}

#[tokio::test]
async fn deleting_the_open_conversation_returns_to_a_fresh_session() {
    let server = start_backend().await;
    mount_conversation(&server, 3, &[("Hi", "Hello!")]).await;
    mount_delete(&server, 3).await;
    mount_conversations(&server, &[]).await;

    let mut controller = SessionController::new(client(&server, signed_in_session()));
    let id = ConversationId::from("3");
    controller.select_conversation(id.clone()).await.unwrap();
    controller.delete_conversation(&id).await.unwrap();

    assert!(controller.active_conversation().is_none());
    assert!(controller.transcript().is_empty());
    assert!(controller.conversations().is_empty());
}

#[tokio::test]
async fn missing_conversation_leaves_empty_transcript() {
    let server = start_backend().await;

    let mut controller = SessionController::new(client(&server, signed_in_session()));
    let err = controller
        .select_conversation(ConversationId::from("404"))
        .await
        .unwrap_err();

    assert!(!err.requires_login());
    assert!(controller.transcript().is_empty());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn two_phase_send_is_visible_before_the_reply() {
    let server = start_backend().await;
    mount_chat_reply(&server, 8, "Hello!").await;
    mount_conversations(&server, &[(8, "Hi")]).await;

    let backend = client(&server, signed_in_session());
    let mut controller = SessionController::new(backend.clone());

    let pending = controller.begin_send("Hi", None).unwrap();
    assert_eq!(controller.transcript().len(), 1);
    assert!(controller.is_busy());
    assert!(server.received_requests().await.unwrap().is_empty());

    let result = backend.send_chat_message(pending.request()).await;
    let outcome = controller.complete_send(pending, result);
    assert!(outcome.started_conversation());
    assert_eq!(controller.transcript().len(), 2);
}

//! Gate, login and logout against a mock backend

use docchat_client::AuthSession;
use docchat_config::CredentialStore;
use docchat_session::{AuthGate, GateDecision, RedirectReason, SessionController, logout};
use docchat_types::{CurrentUser, Route};

use crate::common::{
    client, mount_conversations, mount_current_user, mount_current_user_rejected, mount_login,
    signed_in_session, start_backend,
};

#[tokio::test]
async fn expired_credential_redirects_before_chat_mounts() {
    let server = start_backend().await;
    mount_current_user_rejected(&server).await;

    let session = signed_in_session();
    let client = client(&server, session.clone());
    let decision = AuthGate::verify(&client).await;

    assert_eq!(
        decision,
        GateDecision::Redirect {
            to: Route::Login,
            reason: RedirectReason::Rejected
        }
    );
    assert!(!session.is_authenticated());

    // Only the credential check reached the server.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/api/auth/me");
}

#[tokio::test]
async fn login_then_gate_mounts_chat() {
    let server = start_backend().await;
    mount_login(&server, crate::common::TOKEN).await;
    mount_current_user(&server, "ada@example.com").await;

    let session = AuthSession::new();
    let client = client(&server, session.clone());
    assert!(!AuthGate::verify(&client).await.is_mount());

    let credential = client.login("ada@example.com", "hunter2").await.unwrap();
    session.begin(credential);

    assert_eq!(
        AuthGate::verify(&client).await,
        GateDecision::Mount(Some(CurrentUser {
            email: "ada@example.com".to_string()
        }))
    );
}

#[tokio::test]
async fn logout_stops_sending_the_credential() {
    let server = start_backend().await;
    mount_conversations(&server, &[(1, "Invoices")]).await;

    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("credential"));
    let session = signed_in_session();
    store.save(&session.credential().unwrap()).unwrap();

    let mut controller = SessionController::new(client(&server, session.clone()));
    controller.load_conversations().await.unwrap();

    assert_eq!(logout(&session, &store), Route::Login);
    assert!(store.load().unwrap().is_none());
    assert!(!AuthGate::check(&session).is_mount());

    controller.load_conversations().await.unwrap();
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_some());
    assert!(requests[1].headers.get("authorization").is_none());
}

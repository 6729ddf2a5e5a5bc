//! Config file and credential store on disk

use std::fs;
use std::time::Duration;

use docchat_client::{AuthSession, ClientSettings};
use docchat_config::{CredentialStore, DocchatConfig};
use docchat_session::AuthGate;
use docchat_types::{Credential, ViewMode};

#[test]
fn stored_credential_restores_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join(".docchat").join("credential"));
    store.save(&Credential::new("persisted").unwrap()).unwrap();

    let session = AuthSession::new();
    if let Some(credential) = store.load().unwrap() {
        session.begin(credential);
    }
    assert!(AuthGate::check(&session).is_mount());
    assert_eq!(session.credential().unwrap().expose(), "persisted");
}

#[test]
fn config_file_drives_client_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[server]
base_url = "https://docs.example.com/api/"
request_timeout_secs = 20
chat_timeout_secs = 60

[app]
view = "knowledge"
"#,
    )
    .unwrap();

    let config = DocchatConfig::load_from(&path).unwrap().unwrap();
    let base_url = config
        .server
        .as_ref()
        .and_then(|server| server.base_url.clone())
        .unwrap();
    let mut settings = ClientSettings::new(&base_url).unwrap();
    if let Some(timeout) = config.request_timeout() {
        settings = settings.with_request_timeout(timeout);
    }
    if let Some(timeout) = config.chat_timeout() {
        settings = settings.with_chat_timeout(timeout);
    }

    assert_eq!(
        settings.endpoint(&["conversations", "7"]).as_str(),
        "https://docs.example.com/api/conversations/7"
    );
    assert_eq!(settings.request_timeout(), Duration::from_secs(20));
    // Below the floor for uploads.
    assert_eq!(settings.chat_timeout(), Duration::from_secs(120));
    assert_eq!(config.view_mode(), ViewMode::Knowledge);
}

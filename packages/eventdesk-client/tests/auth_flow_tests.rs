//! Integration tests for login, logout and profile management.

mod common;

use common::{MockBackend, PASSWORD};
use eventdesk_client::{
    AuthContext, AuthService, ClientError, CredentialStore, FileCredentialStore, ProfileUpdate,
    SessionEvent, UserRole,
};
use std::sync::Arc;

#[tokio::test]
async fn test_login_persists_credentials_and_unlocks_profile() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let auth = AuthService::new(client.clone());
    let mut events = client.subscribe();

    assert!(!auth.is_authenticated());

    let response = auth.login("user7@example.com", PASSWORD).await.unwrap();
    assert_eq!(response.user.role, UserRole::Student);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn);

    assert!(auth.is_authenticated());
    assert_eq!(auth.current_user().map(|u| u.id), Some(7));
    assert_eq!(client.store().refresh_token().unwrap().as_deref(), Some("refresh-1"));

    let login = &backend.requests_to("/api/v1/login/")[0];
    assert!(login.authorization.is_none());

    let profile = auth.get_profile().await.unwrap();
    assert_eq!(profile.email, "user7@example.com");
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_bad_credentials_surface_server_message() {
    let backend = MockBackend::start().await;
    let auth = AuthService::new(backend.client());

    let err = auth.login("user7@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "No active account found with the given credentials");
    assert_eq!(backend.refresh_calls(), 0);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_logout_blacklists_refresh_token_and_clears_store() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    let auth = AuthService::new(client.clone());
    let mut events = client.subscribe();

    auth.logout().await.unwrap();

    assert_eq!(backend.logout_bodies(), vec![serde_json::json!({ "refresh": "refresh-1" })]);
    assert!(!auth.is_authenticated());
    assert!(auth.current_user().is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn test_logout_clears_store_when_blacklist_fails() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    let auth = AuthService::new(client.clone());
    backend.reject_all_tokens();

    auth.logout().await.unwrap();
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_update_profile_refreshes_cached_user() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    let context = AuthContext::new(AuthService::new(client));

    let update = ProfileUpdate {
        first_name: Some("Grace".into()),
        ..Default::default()
    };
    let user = context.update_profile(&update).await.unwrap();

    assert_eq!(user.display_name(), "Grace");
    assert_eq!(context.user().map(|u| u.display_name()), Some("Grace".to_string()));
    assert_eq!(
        context.auth().current_user().map(|u| u.display_name()),
        Some("Grace".to_string())
    );
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    let auth = AuthService::new(backend.client_with_store(Arc::new(FileCredentialStore::new(&path))));
    auth.login("user7@example.com", PASSWORD).await.unwrap();

    // A new process reads the same file.
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(&path));
    let context = AuthContext::new(AuthService::new(backend.client_with_store(store)));
    assert!(context.is_authenticated());
    assert_eq!(context.user_role(), Some(UserRole::Student));

    let profile = context.auth().get_profile().await.unwrap();
    assert_eq!(profile.id, 7);
}

#[tokio::test]
async fn test_logout_without_session_is_noop() {
    let backend = MockBackend::start().await;
    let auth = AuthService::new(backend.client());

    auth.logout().await.unwrap();
    assert!(backend.requests().is_empty());
    assert!(matches!(
        auth.get_profile().await.unwrap_err(),
        ClientError::NotAuthenticated
    ));
}

//! Integration tests for bearer authorization and the refresh-once contract.

mod common;

use common::MockBackend;
use eventdesk_client::{
    ApiClient, AuthContext, AuthService, ClientError, Credentials, MemoryCredentialStore, SessionEvent, User,
};
use std::sync::Arc;
use std::time::Duration;

const PROFILE: &str = "/api/v1/users/me/";

#[tokio::test]
async fn test_authenticated_request_sends_bearer_token() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();

    let user: User = client.get(PROFILE).await.unwrap();
    assert_eq!(user.id, 7);

    let requests = backend.requests_to(PROFILE);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer access-1"));
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_missing_token_fails_without_network_io() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let err = client.get::<User>(PROFILE).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_expired_access_token_refreshes_and_retries_once() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    backend.expire_access_token();

    let user: User = client.get(PROFILE).await.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(backend.refresh_calls(), 1);

    let requests = backend.requests_to(PROFILE);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer access-1"));
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer access-3"));

    // The refreshed token was persisted; the next call goes straight through.
    assert_eq!(client.store().access_token().unwrap().as_deref(), Some("access-3"));
    let _: User = client.get(PROFILE).await.unwrap();
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn test_second_unauthorized_is_terminal() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    backend.reject_all_tokens();

    let err = client.get::<User>(PROFILE).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.requests_to(PROFILE).len(), 2);
    // Refresh succeeded, so the session is still considered alive.
    assert!(client.store().access_token().unwrap().is_some());
}

#[tokio::test]
async fn test_refresh_failure_expires_session() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    let mut events = client.subscribe();
    backend.revoke_refresh_token();

    let err = client.get::<User>(PROFILE).await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.requests_to(PROFILE).len(), 1);
    assert_eq!(client.store().load().unwrap(), Credentials::default());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);

    // Until a new login, nothing authenticated leaves the client.
    let err = client.get::<User>(PROFILE).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
    assert_eq!(backend.requests_to(PROFILE).len(), 1);
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    backend.expire_access_token();

    let (a, b, c) = tokio::join!(
        client.get::<User>(PROFILE),
        client.get::<User>(PROFILE),
        client.get::<User>(PROFILE),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn test_custom_refresher_is_used() {
    use async_trait::async_trait;
    use eventdesk_client::{Result, TokenRefresher};

    struct Failing;

    #[async_trait]
    impl TokenRefresher for Failing {
        async fn refresh(&self) -> Result<String> {
            Err(ClientError::NotAuthenticated)
        }
    }

    let backend = MockBackend::start().await;
    let logged_in = backend.logged_in_client();
    let credentials = logged_in.store().load().unwrap();
    backend.expire_access_token();

    let client = ApiClient::with_refresher(
        backend.config(),
        Arc::new(MemoryCredentialStore::with_credentials(credentials)),
        Arc::new(Failing),
    );

    let err = client.get::<User>(PROFILE).await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_auth_context_clears_on_expiry() {
    let backend = MockBackend::start().await;
    let client = backend.logged_in_client();
    let context = AuthContext::new(AuthService::new(client.clone()));
    let listener = context.spawn_session_listener();
    let mut state = context.subscribe();

    assert!(context.is_authenticated());
    assert!(context.is_admin());

    backend.revoke_refresh_token();
    let _ = client.get::<User>(PROFILE).await;

    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| !s.is_authenticated))
        .await
        .expect("auth state was not cleared")
        .unwrap();
    assert!(context.user().is_none());
    assert!(context.user_role().is_none());

    listener.abort();
}

//! Login, registration, token refresh and profile endpoints.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::credentials::{CredentialStore, Credentials};
use crate::endpoints;
use crate::error::{ApiError, ClientError, Result};
use crate::http::{ApiClient, ApiRequest, SessionEvent};
use crate::models::{AuthResponse, ProfileUpdate, RefreshResponse, RegisterRequest, User};

/// Produces a new access token when the current one is rejected.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Returns the new access token. Implementations persist it themselves.
    async fn refresh(&self) -> Result<String>;
}

/// Refresh against `POST /api/v1/token/refresh/`.
///
/// Talks to the endpoint directly rather than through [`ApiClient`], so a
/// rejected refresh never recurses into another refresh.
pub struct RefreshEndpoint {
    http: reqwest::Client,
    config: RuntimeConfig,
    store: Arc<dyn CredentialStore>,
}

impl RefreshEndpoint {
    pub fn new(http: reqwest::Client, config: RuntimeConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self { http, config, store }
    }
}

#[async_trait]
impl TokenRefresher for RefreshEndpoint {
    async fn refresh(&self) -> Result<String> {
        let refresh = self
            .store
            .refresh_token()?
            .ok_or(ClientError::NotAuthenticated)?;

        let response = self
            .http
            .post(self.config.url(endpoints::TOKEN_REFRESH))
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "refresh": refresh }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body).into());
        }

        let RefreshResponse { access } = response.json().await?;
        self.store.set_access_token(&access)?;
        debug!("Access token refreshed");
        Ok(access)
    }
}

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = ApiRequest::post(endpoints::LOGIN)
            .anonymous()
            .json(&json!({ "email": email, "password": password }))?;
        let response: AuthResponse = self.client.send(request).await?;

        self.persist(&response)?;
        info!(user_id = response.user.id, role = %response.user.role, "Logged in");
        Ok(response)
    }

    pub async fn register(&self, data: &RegisterRequest) -> Result<AuthResponse> {
        let request = ApiRequest::post(endpoints::USERS).anonymous().json(data)?;
        let response: AuthResponse = self.client.send(request).await?;

        self.persist(&response)?;
        info!(user_id = response.user.id, "Registered");
        Ok(response)
    }

    fn persist(&self, response: &AuthResponse) -> Result<()> {
        self.client.store().save(&Credentials::new(
            response.access.clone(),
            response.refresh.clone(),
            response.user.clone(),
        ))?;
        self.client.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    pub async fn refresh_token(&self) -> Result<String> {
        self.client.refresh_token().await
    }

    pub async fn get_profile(&self) -> Result<User> {
        self.client.get(endpoints::PROFILE).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let user: User = self.client.put(endpoints::PROFILE, update).await?;
        self.client.store().set_user(&user)?;
        Ok(user)
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        let request = ApiRequest::post(endpoints::CHANGE_PASSWORD).json(&json!({
            "old_password": old_password,
            "new_password": new_password,
        }))?;
        self.client.send_empty(request).await
    }

    /// Blacklist the refresh token if possible, then forget all credentials.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh) = self.client.store().refresh_token()? {
            let blacklist = ApiRequest::post(endpoints::LOGOUT).json(&json!({ "refresh": refresh }))?;
            if let Err(error) = self.client.send_empty(blacklist).await {
                warn!(%error, "Logout request failed, clearing local credentials anyway");
            }
        }

        self.client.store().clear()?;
        self.client.emit(SessionEvent::LoggedOut);
        info!("Logged out");
        Ok(())
    }

    /// True when a non-empty access token is stored. Expiry is not inspected.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.client.store().access_token(), Ok(Some(_)))
    }

    pub fn current_user(&self) -> Option<User> {
        self.client.store().load().ok().and_then(|c| c.user)
    }
}

#[async_trait]
impl TokenRefresher for AuthService {
    async fn refresh(&self) -> Result<String> {
        self.refresh_token().await
    }
}

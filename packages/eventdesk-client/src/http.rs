//! Authenticated HTTP client.
//!
//! Every authenticated request carries `Authorization: Bearer <access>`.
//! A 401 answer triggers exactly one refresh and exactly one retry of the
//! same request; a 401 on the retry is returned to the caller as-is. When the
//! refresh itself fails the credential store is cleared and
//! [`SessionEvent::Expired`] is broadcast.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::auth::{RefreshEndpoint, TokenRefresher};
use crate::config::RuntimeConfig;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, ClientError, Result};
use crate::query::QueryParams;

/// Credential lifecycle notifications for the hosting shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// The refresh token was rejected; the user has to log in again.
    Expired,
}

// =============================================================================
// Request description
// =============================================================================

#[derive(Debug, Clone)]
enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Multipart body that can be rebuilt for the retry after a refresh.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime_type,
            bytes,
        });
        self
    }

    /// Names of all fields, in insertion order.
    pub fn field_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .map(|p| match p {
                FormPart::Text { name, .. } | FormPart::File { name, .. } => name.as_str(),
            })
            .collect()
    }

    fn to_reqwest(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let mut file = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone());
                    if let Some(mime) = mime_type {
                        file = file
                            .mime_str(mime)
                            .map_err(|e| ClientError::Config(format!("invalid MIME type {}: {}", mime, e)))?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
    pub authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Config(format!("failed to serialize request body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send without a bearer token and without the refresh/retry path.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    fn header_overrides(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("invalid header name {}: {}", name, e)))?;
            // Multipart bodies need the runtime-generated boundary.
            if self.body.is_multipart() && name == CONTENT_TYPE {
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("invalid header value for {}: {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

// =============================================================================
// Client
// =============================================================================

struct Inner {
    http: Client,
    config: RuntimeConfig,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

/// Cheap to clone; clones share the credential store, the refresh lock and
/// the session event channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Client whose refreshes go to the token refresh endpoint.
    pub fn new(config: RuntimeConfig, store: Arc<dyn CredentialStore>) -> Self {
        let http = Client::new();
        let refresher = Arc::new(RefreshEndpoint::new(http.clone(), config.clone(), store.clone()));
        Self::build(http, config, store, refresher)
    }

    /// Client with a custom refresh strategy.
    pub fn with_refresher(
        config: RuntimeConfig,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self::build(Client::new(), config, store, refresher)
    }

    fn build(
        http: Client,
        config: RuntimeConfig,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                store,
                refresher,
                refresh_lock: Mutex::new(()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Subscribe to login/logout/expiry notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh_token(&self) -> Result<String> {
        self.inner.refresher.refresh().await
    }

    /// Send a request and return the successful response.
    pub async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let token = if request.authenticated {
            Some(
                self.inner
                    .store
                    .access_token()?
                    .ok_or(ClientError::NotAuthenticated)?,
            )
        } else {
            None
        };

        let response = self.dispatch(request, token.as_deref()).await?;

        match token {
            Some(rejected) if response.status() == StatusCode::UNAUTHORIZED => {
                debug!(path = %request.path, "Access token rejected, refreshing");
                let fresh = self.refresh_after_unauthorized(&rejected).await?;
                let retried = self.dispatch(request, Some(&fresh)).await?;
                Self::check(request, retried).await
            }
            _ => Self::check(request, response).await,
        }
    }

    /// Refresh once for a request whose token was rejected.
    ///
    /// Refreshes are serialized. A caller that waited while another one
    /// refreshed picks up the new token instead of refreshing again.
    async fn refresh_after_unauthorized(&self, rejected: &str) -> Result<String> {
        let _guard = self.inner.refresh_lock.lock().await;

        match self.inner.store.access_token()? {
            Some(current) if current != rejected => return Ok(current),
            // Another caller already ended the session.
            None => return Err(ClientError::SessionExpired),
            Some(_) => {}
        }

        match self.inner.refresher.refresh().await {
            Ok(token) => Ok(token),
            Err(error) => {
                warn!(%error, "Token refresh failed, ending session");
                self.expire_session();
                Err(ClientError::SessionExpired)
            }
        }
    }

    fn expire_session(&self) {
        if let Err(error) = self.inner.store.clear() {
            warn!(%error, "Failed to clear credentials");
        }
        self.emit(SessionEvent::Expired);
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let url = self.inner.config.url(&request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(request.query.pairs());
        }

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Multipart(form) => builder.multipart(form.to_reqwest()?),
            RequestBody::Json(value) => builder.header(CONTENT_TYPE, "application/json").json(value),
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
        };

        builder = builder.headers(request.header_overrides()?);

        let start = Instant::now();
        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "Request failed");
            ClientError::Network(e.to_string())
        })?;

        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "API request"
        );

        Ok(response)
    }

    async fn check(request: &ApiRequest, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status.as_u16(), &body);
        warn!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            error = %error.message,
            "API error"
        );
        Err(ClientError::Api(error))
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// Send and deserialize the body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(&request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        decode(&request.path, &bytes)
    }

    /// Send and discard the body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.execute(&request).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn get_with<T: DeserializeOwned>(&self, path: &str, query: QueryParams) -> Result<T> {
        self.send(ApiRequest::get(path).query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send_empty(ApiRequest::delete(path)).await
    }

    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: MultipartForm) -> Result<T> {
        self.send(ApiRequest::post(path).multipart(form)).await
    }
}

/// Empty bodies (204) decode as JSON `null`, which suits `()` and `Option<T>`.
fn decode<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> Result<T> {
    let result = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };

    result.map_err(|e| {
        warn!(path, error = %e, "Failed to decode response");
        ClientError::Decode(format!("{}: {}", path, e))
    })
}

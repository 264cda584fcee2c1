//! EventDesk REST API client
//!
//! Talks to the event-management backend (users, events, sessions, files,
//! notifications) over JSON/HTTP. Requests are authorized with a JWT access
//! token; a 401 triggers exactly one token refresh and exactly one retry.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eventdesk_client::{ApiClient, AuthService, EventFilter, EventsService, MemoryCredentialStore, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env();
//! let client = ApiClient::new(config, Arc::new(MemoryCredentialStore::new()));
//! let auth = AuthService::new(client.clone());
//!
//! auth.login("ada@example.com", "hunter2").await?;
//!
//! let events = EventsService::new(client.clone());
//! for event in events.list(&EventFilter::default()).await?.results {
//!     println!("{}", event.name);
//! }
//! ```
//!
//! # Session expiry
//!
//! The library never navigates anywhere. When a refresh fails it clears the
//! credential store and broadcasts [`SessionEvent::Expired`]; the hosting
//! shell subscribes via [`ApiClient::subscribe`] and decides what to do.

pub mod auth;
pub mod config;
pub mod context;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod models;
pub mod query;
pub mod services;
pub mod status;

pub use auth::{AuthService, RefreshEndpoint, TokenRefresher};
pub use config::{init_runtime_config, runtime_config, RuntimeConfig, DEFAULT_API_BASE_URL};
pub use context::{AuthContext, AuthState};
pub use credentials::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use error::{ApiError, ClientError, Result};
pub use http::{ApiClient, ApiRequest, MultipartForm, RequestBody, SessionEvent};
pub use models::*;
pub use query::{QueryParams, QueryValue};
pub use services::{
    EventsService, FilesService, NotificationPoller, NotificationSnapshot, NotificationsService,
    UsersService, DEFAULT_POLL_INTERVAL,
};
pub use status::{
    event_current_status, registration_open, session_timing, timing_of, EventCurrentStatus,
    SessionTiming,
};

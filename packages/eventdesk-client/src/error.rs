//! Error types for the EventDesk client.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response reached us (connection refused, DNS, TLS, reset).
    #[error("No connection to the server: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An authenticated call was attempted without an access token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The refresh token was rejected; stored credentials have been cleared.
    #[error("Session expired")]
    SessionExpired,

    /// A 2xx body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Credential store I/O failure.
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// Invalid client input (header values, URLs).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// Message suitable for the error banner of the interacting view.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "No connection to the server".to_string(),
            ClientError::Api(e) => e.message.clone(),
            ClientError::NotAuthenticated => "Please log in".to_string(),
            ClientError::SessionExpired => "Session expired, please log in again".to_string(),
            other => other.to_string(),
        }
    }

    /// Field-level validation messages, empty unless this is a validation error.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ClientError::Api(e) if e.is_validation() => e.field_errors(),
            _ => BTreeMap::new(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

/// Normalized non-2xx response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Raw JSON body, when the body was JSON.
    pub body: Option<Value>,
}

impl ApiError {
    /// Build from a status code and the raw response text.
    ///
    /// Message precedence: `detail`, `error`, `message`, the first
    /// `non_field_errors` entry, the first field-keyed message, then a
    /// generic `HTTP error <status>`.
    pub fn from_response(status: u16, body_text: &str) -> Self {
        let body = serde_json::from_str::<Value>(body_text).ok();
        let message = body
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| format!("HTTP error {}", status));

        Self {
            status,
            message,
            body,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.status, 400 | 422)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// DRF validation body mapped to field name -> first message.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let Some(Value::Object(map)) = &self.body else {
            return out;
        };

        for (field, value) in map {
            if let Some(first) = first_message(value) {
                out.insert(field.clone(), first);
            }
        }
        out
    }
}

fn extract_message(body: &Value) -> Option<String> {
    let map = body.as_object()?;

    for key in ["detail", "error", "message"] {
        if let Some(Value::String(s)) = map.get(key) {
            if !s.is_empty() {
                return Some(s.clone());
            }
        }
    }

    if let Some(msg) = map.get("non_field_errors").and_then(first_message) {
        return Some(msg);
    }

    map.iter()
        .find_map(|(field, value)| first_message(value).map(|m| format!("{}: {}", field, m)))
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

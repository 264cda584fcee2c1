//! Runtime configuration.
//!
//! The backend origin is injected at container start as a small JSON object
//! (`{"API_BASE_URL": "https://api.example.org"}`). Anything missing or
//! malformed silently falls back to [`DEFAULT_API_BASE_URL`].

use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;

/// Backend origin used when nothing was injected.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Key of the backend origin in the injected config object.
pub const API_BASE_URL_KEY: &str = "API_BASE_URL";

static RUNTIME_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_base_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Config with an explicit base URL (trailing slashes trimmed).
    pub fn new(api_base_url: impl AsRef<str>) -> Self {
        Self::from_value(Some(api_base_url.as_ref()))
    }

    /// Read `API_BASE_URL` from an injected config object.
    pub fn from_injected(value: Option<&Value>) -> Self {
        let url = value
            .and_then(|v| v.get(API_BASE_URL_KEY))
            .and_then(Value::as_str);
        Self::from_value(url)
    }

    /// Read `API_BASE_URL` from the environment, loading `.env` if present.
    pub fn from_env() -> Self {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let url = std::env::var(API_BASE_URL_KEY).ok();
        Self::from_value(url.as_deref())
    }

    /// Read the injected config object from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()));

        match parsed {
            Ok(value) => Self::from_injected(Some(&value)),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Ignoring unreadable runtime config");
                Self::default()
            }
        }
    }

    fn from_value(url: Option<&str>) -> Self {
        let trimmed = url
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty());

        match trimmed {
            Some(u) => Self {
                api_base_url: u.to_string(),
            },
            None => Self::default(),
        }
    }

    /// Join the base URL with an absolute API path such as `/api/v1/events/`.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }
}

/// Install the process-wide runtime config. The first call wins.
pub fn init_runtime_config(config: RuntimeConfig) {
    RUNTIME_CONFIG.set(config).ok();
}

/// Process-wide runtime config, or the default if none was installed.
pub fn runtime_config() -> &'static RuntimeConfig {
    static FALLBACK: OnceLock<RuntimeConfig> = OnceLock::new();
    RUNTIME_CONFIG
        .get()
        .unwrap_or_else(|| FALLBACK.get_or_init(RuntimeConfig::default))
}

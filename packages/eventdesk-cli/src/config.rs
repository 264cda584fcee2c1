//! Where the CLI finds the backend and keeps its credentials.
//!
//! Backend origin precedence: `--api-url` flag, then `API_BASE_URL`, then the
//! injected JSON file named by `--config` / `EVENTDESK_CONFIG`, then the
//! built-in default.

use anyhow::{Context, Result};
use eventdesk_client::RuntimeConfig;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "eventdesk";
const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub runtime: RuntimeConfig,
    pub credentials_path: PathBuf,
}

impl CliConfig {
    /// `api_url` already carries the flag-over-env precedence from clap.
    pub fn resolve(
        api_url: Option<&str>,
        config_file: Option<&Path>,
        credentials: Option<&Path>,
    ) -> Result<Self> {
        let runtime = match (api_url, config_file) {
            (Some(url), _) => RuntimeConfig::new(url),
            (None, Some(file)) => RuntimeConfig::from_file(file),
            (None, None) => RuntimeConfig::default(),
        };

        let credentials_path = match credentials {
            Some(path) => path.to_path_buf(),
            None => default_credentials_path()?,
        };

        Ok(Self {
            runtime,
            credentials_path,
        })
    }
}

fn default_credentials_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .context("Could not determine a config directory; pass --credentials")?;
    Ok(base.join(APP_DIR).join(CREDENTIALS_FILE))
}

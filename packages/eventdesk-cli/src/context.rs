//! Application context with shared clients and output helpers

use anyhow::{bail, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use eventdesk_client::{
    init_runtime_config, runtime_config, ApiClient, AuthContext, AuthService, EventsService,
    FileCredentialStore, FilesService, NotificationsService, User, UsersService,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::CliConfig;

/// Application context passed to all commands
pub struct AppContext {
    pub quiet: bool,
    pub json: bool,
    pub config: CliConfig,
    pub client: ApiClient,
    pub auth: AuthContext,
}

impl AppContext {
    /// Installs the resolved runtime config process-wide before building the client.
    pub fn new(config: CliConfig, quiet: bool, json: bool) -> Self {
        init_runtime_config(config.runtime.clone());
        let store = Arc::new(FileCredentialStore::new(&config.credentials_path));
        let client = ApiClient::new(runtime_config().clone(), store);
        let auth = AuthContext::new(AuthService::new(client.clone()));
        Self {
            quiet,
            json,
            config,
            client,
            auth,
        }
    }

    pub fn events(&self) -> EventsService {
        EventsService::new(self.client.clone())
    }

    pub fn users(&self) -> UsersService {
        UsersService::new(self.client.clone())
    }

    pub fn notifications(&self) -> NotificationsService {
        NotificationsService::new(self.client.clone())
    }

    pub fn files(&self) -> FilesService {
        FilesService::new(self.client.clone())
    }

    /// The logged-in user, or an error telling how to log in.
    pub fn require_user(&self) -> Result<User> {
        match self.auth.user() {
            Some(user) if self.auth.is_authenticated() => Ok(user),
            _ => bail!("Not logged in. Run `eventdesk login` first."),
        }
    }

    pub fn require_admin(&self) -> Result<User> {
        let user = self.require_user()?;
        if !user.is_admin() {
            bail!("This command requires an administrator account.");
        }
        Ok(user)
    }

    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.quiet {
            return Ok(default);
        }
        Ok(Confirm::with_theme(&self.theme())
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    /// Print raw JSON when `--json` was given. Returns whether it did.
    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<bool> {
        if !self.json {
            return Ok(false);
        }
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(true)
    }

    pub fn print_header(&self, msg: &str) {
        if !self.quiet {
            println!();
            println!("{}", style(msg).bold());
        }
    }

    pub fn print_success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).green());
        }
    }

    pub fn print_warning(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).yellow());
        }
    }

    pub fn print_info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).cyan());
        }
    }
}

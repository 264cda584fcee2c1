//! EventDesk command-line portal
//!
//! Log in, browse events and sessions, manage files and notifications, and
//! administer users against an EventDesk backend.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eventdesk_client::{ClientError, SessionEvent};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::{self, error::TryRecvError};

mod cmd;
mod config;
mod context;
mod format;

use config::CliConfig;
use context::AppContext;

#[derive(Parser)]
#[command(name = "eventdesk")]
#[command(about = "EventDesk event-management portal")]
#[command(version)]
struct Cli {
    /// Backend origin, e.g. https://events.example.org
    #[arg(long, global = true, env = "API_BASE_URL")]
    api_url: Option<String>,

    /// JSON file with an injected `API_BASE_URL`
    #[arg(long, global = true, env = "EVENTDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Credential file (defaults to the user config directory)
    #[arg(long, global = true, env = "EVENTDESK_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    /// Run in quiet mode (non-interactive)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with e-mail and password
    Login {
        /// Account e-mail (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Create an account and log in
    Register(cmd::auth::RegisterArgs),

    /// Log out and forget stored credentials
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Profile management
    #[command(subcommand)]
    Profile(cmd::auth::ProfileCommand),

    /// Role-based overview
    Dashboard,

    /// Events, sessions and participation
    #[command(subcommand)]
    Events(cmd::events::EventsCommand),

    /// User administration (admin only)
    #[command(subcommand)]
    Users(cmd::users::UsersCommand),

    /// Notification inbox
    #[command(subcommand)]
    Notifications(cmd::notifications::NotificationsCommand),

    /// File storage
    #[command(subcommand)]
    Files(cmd::files::FilesCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match CliConfig::resolve(
        cli.api_url.as_deref(),
        cli.config.as_deref(),
        cli.credentials.as_deref(),
    ) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return ExitCode::from(1);
        }
    };
    tracing::debug!(api = %config.runtime.api_base_url, "Resolved configuration");

    let ctx = AppContext::new(config, cli.quiet, cli.json);
    let _listener = ctx.auth.spawn_session_listener();
    let mut session = ctx.client.subscribe();

    let result = run(&ctx, cli.command).await;

    if session_expired(&mut session) {
        print_relogin_hint();
        return ExitCode::from(1);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(1)
        }
    }
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email } => cmd::auth::login(ctx, email).await,
        Commands::Register(args) => cmd::auth::register(ctx, args).await,
        Commands::Logout => cmd::auth::logout(ctx).await,
        Commands::Whoami => cmd::auth::whoami(ctx).await,
        Commands::Profile(cmd) => cmd::auth::run_profile(ctx, cmd).await,
        Commands::Dashboard => cmd::dashboard::run(ctx).await,
        Commands::Events(cmd) => cmd::events::run(ctx, cmd).await,
        Commands::Users(cmd) => cmd::users::run(ctx, cmd).await,
        Commands::Notifications(cmd) => cmd::notifications::run(ctx, cmd).await,
        Commands::Files(cmd) => cmd::files::run(ctx, cmd).await,
    }
}

fn session_expired(session: &mut broadcast::Receiver<SessionEvent>) -> bool {
    loop {
        match session.try_recv() {
            Ok(SessionEvent::Expired) => return true,
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return false,
        }
    }
}

fn print_relogin_hint() {
    eprintln!(
        "{} Your session has expired. Run {} to sign in again.",
        "Error:".red().bold(),
        "eventdesk login".bold()
    );
}

fn report(error: &anyhow::Error) {
    let Some(client_error) = error.downcast_ref::<ClientError>() else {
        eprintln!("{} {:#}", "Error:".red().bold(), error);
        return;
    };

    if matches!(client_error, ClientError::SessionExpired) {
        print_relogin_hint();
        return;
    }

    eprintln!("{} {}", "Error:".red().bold(), client_error.user_message());
    for (field, message) in client_error.field_errors() {
        eprintln!("  {} {}", format!("{}:", field).yellow(), message);
    }
}

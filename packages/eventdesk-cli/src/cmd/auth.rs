//! Login, registration and profile commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Password};
use eventdesk_client::{ProfileUpdate, RegisterRequest, User, UserRole};

use crate::context::AppContext;
use crate::format;

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    /// Account role (student, teacher, referee)
    #[arg(long)]
    role: Option<String>,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Update profile fields; omitted fields stay unchanged
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        middle_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Change the account password
    Password,
}

fn prompt(ctx: &AppContext, label: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::with_theme(&ctx.theme())
            .with_prompt(label)
            .interact_text()?),
    }
}

fn prompt_optional(ctx: &AppContext, label: &str, value: Option<String>) -> Result<Option<String>> {
    if value.is_some() || ctx.quiet {
        return Ok(value);
    }
    let input: String = Input::with_theme(&ctx.theme())
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?;
    Ok(Some(input).filter(|s| !s.trim().is_empty()))
}

pub async fn login(ctx: &AppContext, email: Option<String>) -> Result<()> {
    let email = prompt(ctx, "Email", email)?;
    let password = Password::with_theme(&ctx.theme())
        .with_prompt("Password")
        .interact()?;

    let response = ctx.auth.login(&email, &password).await?;
    ctx.print_success(&format!(
        "Logged in as {} ({})",
        response.user.display_name(),
        response.user.role.label()
    ));
    Ok(())
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let email = prompt(ctx, "Email", args.email)?;
    let first_name = prompt(ctx, "First name", args.first_name)?;
    let last_name = prompt_optional(ctx, "Last name", args.last_name)?;
    let password = Password::with_theme(&ctx.theme())
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let request = RegisterRequest {
        email,
        password_confirm: password.clone(),
        password,
        first_name,
        middle_name: None,
        last_name,
        phone: args.phone,
        role: args.role.map(UserRole::from),
    };

    let response = ctx.auth.register(&request).await?;
    if let Some(message) = &response.message {
        ctx.print_info(message);
    }
    ctx.print_success(&format!("Welcome, {}!", response.user.display_name()));
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if !ctx.auth.is_authenticated() {
        ctx.print_warning("Not logged in.");
        return Ok(());
    }
    ctx.auth.logout().await?;
    ctx.print_success("Logged out.");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    ctx.require_user()?;
    let user = ctx.auth.auth().get_profile().await?;
    if ctx.emit_json(&user)? {
        return Ok(());
    }
    print_user(&user);
    println!("  {:<12} {}", "Server", ctx.config.runtime.api_base_url);
    println!(
        "  {:<12} {}",
        "Credentials",
        ctx.config.credentials_path.display().to_string().dimmed()
    );
    Ok(())
}

pub fn print_user(user: &User) {
    println!("{} {}", user.display_name().bold(), format!("#{}", user.id).dimmed());
    println!("  {:<12} {}", "Email", user.email);
    println!("  {:<12} {}", "Role", user.role.label());
    if let Some(phone) = &user.phone {
        println!("  {:<12} {}", "Phone", phone);
    }
    println!("  {:<12} {}", "Active", format::yes_no(user.is_active));
    println!("  {:<12} {}", "Joined", format::datetime(user.created_at));
    println!("  {:<12} {}", "Last login", format::datetime(user.last_login_at));
}

pub async fn run_profile(ctx: &AppContext, cmd: ProfileCommand) -> Result<()> {
    ctx.require_user()?;

    match cmd {
        ProfileCommand::Update {
            first_name,
            middle_name,
            last_name,
            phone,
            avatar_url,
        } => {
            let update = ProfileUpdate {
                first_name,
                middle_name,
                last_name,
                phone,
                avatar_url,
                ..Default::default()
            };
            if update.is_empty() {
                ctx.print_warning("Nothing to update.");
                return Ok(());
            }
            let user = ctx.auth.update_profile(&update).await?;
            if !ctx.emit_json(&user)? {
                ctx.print_success("Profile updated.");
                print_user(&user);
            }
        }
        ProfileCommand::Password => {
            let old_password = Password::with_theme(&ctx.theme())
                .with_prompt("Current password")
                .interact()?;
            let new_password = Password::with_theme(&ctx.theme())
                .with_prompt("New password")
                .with_confirmation("Repeat new password", "Passwords do not match")
                .interact()?;
            ctx.auth
                .auth()
                .change_password(&old_password, &new_password)
                .await
                .context("Password change failed")?;
            ctx.print_success("Password changed.");
        }
    }
    Ok(())
}

//! User administration commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use eventdesk_client::{UserFilter, UserRole};

use super::auth::print_user;
use crate::context::AppContext;
use crate::format;

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List users
    List {
        /// Filter by role (admin, student, teacher, referee, user)
        #[arg(long)]
        role: Option<String>,

        /// Free-text search over name and e-mail
        #[arg(short, long)]
        search: Option<String>,

        /// Include deactivated accounts
        #[arg(long)]
        all: bool,

        #[arg(long)]
        page: Option<u32>,
    },

    /// Show one user
    Show { id: i64 },

    /// Event, participation and file counts for a user
    Stats { id: i64 },

    /// Delete a user
    Delete {
        id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(ctx: &AppContext, cmd: UsersCommand) -> Result<()> {
    ctx.require_admin()?;
    let users = ctx.users();

    match cmd {
        UsersCommand::List {
            role,
            search,
            all,
            page,
        } => {
            let filter = UserFilter {
                role: role.map(UserRole::from),
                is_active: if all { None } else { Some(true) },
                search,
                page,
                ..Default::default()
            };
            let page = users.list(&filter).await?;
            if ctx.emit_json(&page)? {
                return Ok(());
            }

            ctx.print_header(&format!("Users ({})", page.count));
            for user in &page.results {
                println!(
                    "  {:>5}  {:<30} {:<32} {}",
                    user.id,
                    format::truncate(&user.display_name(), 30),
                    format::truncate(&user.email, 32),
                    user.role.label().cyan()
                );
            }
            if page.has_next() {
                ctx.print_info("More results available; use --page.");
            }
        }

        UsersCommand::Show { id } => {
            let user = users.get(id).await?;
            if !ctx.emit_json(&user)? {
                print_user(&user);
            }
        }

        UsersCommand::Stats { id } => {
            let (user, stats) = tokio::try_join!(users.get(id), users.statistics(id))?;
            if ctx.emit_json(&stats)? {
                return Ok(());
            }
            ctx.print_header(&user.display_name());
            println!("  {:<26} {}", "Owned events", stats.owned_events);
            println!("  {:<26} {}", "Participations", stats.participations);
            println!("  {:<26} {}", "Confirmed participations", stats.confirmed_participations);
            println!("  {:<26} {}", "Uploaded files", stats.uploaded_files);
        }

        UsersCommand::Delete { id, yes } => {
            let user = users.get(id).await?;
            let prompt = format!("Delete user {} <{}>?", user.display_name(), user.email);
            if !yes && !ctx.confirm(&prompt, false)? {
                ctx.print_warning("Cancelled.");
                return Ok(());
            }
            users.delete(id).await?;
            ctx.print_success(&format!("Deleted user #{}", id));
        }
    }
    Ok(())
}

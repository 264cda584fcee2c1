//! Notification inbox commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use eventdesk_client::{Notification, NotificationPoller, DEFAULT_POLL_INTERVAL};
use std::time::Duration;

use crate::context::AppContext;
use crate::format;

#[derive(Subcommand)]
pub enum NotificationsCommand {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
    },

    /// Mark one notification as read
    Read { id: i64 },

    /// Mark every notification as read
    ReadAll,

    /// Delete one notification
    Delete { id: i64 },

    /// Delete every read notification
    ClearRead,

    /// Keep polling and print new notifications as they arrive
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,
    },
}

pub async fn run(ctx: &AppContext, cmd: NotificationsCommand) -> Result<()> {
    ctx.require_user()?;
    let notifications = ctx.notifications();

    match cmd {
        NotificationsCommand::List { unread } => {
            let mut list = notifications.list().await?;
            if unread {
                list.retain(|n| !n.is_read);
            }
            if ctx.emit_json(&list)? {
                return Ok(());
            }
            if list.is_empty() {
                ctx.print_info("No notifications.");
            }
            for notification in &list {
                print_notification(notification);
            }
        }

        NotificationsCommand::Read { id } => {
            notifications.mark_as_read(id).await?;
            ctx.print_success(&format!("Marked #{} as read.", id));
        }

        NotificationsCommand::ReadAll => {
            let count = notifications.mark_all_as_read_or_zero().await;
            ctx.print_success(&format!("Marked {} notification(s) as read.", count));
        }

        NotificationsCommand::Delete { id } => {
            notifications.delete(id).await?;
            ctx.print_success(&format!("Deleted #{}.", id));
        }

        NotificationsCommand::ClearRead => {
            let count = notifications.delete_all_read().await?;
            ctx.print_success(&format!("Deleted {} read notification(s).", count));
        }

        NotificationsCommand::Watch { interval } => {
            let poller = NotificationPoller::spawn(notifications, Duration::from_secs(interval.max(1)));
            let mut snapshots = poller.subscribe();
            let mut seen = std::collections::HashSet::new();
            let mut session = ctx.client.subscribe();

            ctx.print_info("Watching notifications. Press Ctrl+C to stop.");
            loop {
                tokio::select! {
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = snapshots.borrow_and_update().clone();
                        for notification in snapshot.notifications.iter().filter(|n| seen.insert(n.id)) {
                            print_notification(notification);
                        }
                    }
                    event = session.recv() => {
                        if matches!(event, Ok(eventdesk_client::SessionEvent::Expired)) {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

fn print_notification(notification: &Notification) {
    let marker = if notification.is_read {
        " ".normal()
    } else {
        "●".cyan()
    };
    println!(
        "{} {:>5}  {}  {}",
        marker,
        notification.id,
        format::datetime(notification.created_at).dimmed(),
        notification.title.bold()
    );
    if !notification.text.is_empty() {
        println!("         {}", notification.text);
    }
}

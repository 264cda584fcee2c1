//! Event, session and participation commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use eventdesk_client::{
    event_current_status, timing_of, EventFilter, EventInput, EventStatus, Scheduled, Session,
};

use super::dashboard::event_sessions;
use crate::context::AppContext;
use crate::format;

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events
    List {
        /// Filter by status (draft, published, cancelled, completed)
        #[arg(long)]
        status: Option<EventStatus>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Only events I own
        #[arg(long, conflicts_with = "participating")]
        mine: bool,

        /// Only events I am registered for
        #[arg(long)]
        participating: bool,

        #[arg(long)]
        page: Option<u32>,
    },

    /// Show one event with its sessions
    Show { id: i64 },

    /// Register for an event
    Join { id: i64 },

    /// Withdraw from an event
    Leave { id: i64 },

    /// Create an event
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Registration deadline (RFC 3339)
        #[arg(long)]
        registration_ends_at: Option<DateTime<Utc>>,

        /// Closing time (RFC 3339)
        #[arg(long)]
        closes_at: Option<DateTime<Utc>>,

        /// Publish immediately instead of saving a draft
        #[arg(long)]
        publish: bool,

        #[arg(long)]
        private: bool,
    },

    /// Delete an event
    Delete {
        id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List participants of an event
    Participants { id: i64 },

    /// List sessions of an event
    Sessions {
        id: i64,

        /// Only scheduled sessions that have not started yet
        #[arg(long)]
        upcoming: bool,
    },

    /// Register attendance for an online session
    Attend { session_id: i64 },

    /// Cancel attendance for an online session
    Unattend { session_id: i64 },

    /// Attendance records of an online session (organizers)
    Attendances { session_id: i64 },

    /// Public materials of an online session
    Materials { session_id: i64 },

    /// Confirm a participation (organizers)
    Confirm { participation_id: i64 },
}

pub async fn run(ctx: &AppContext, cmd: EventsCommand) -> Result<()> {
    ctx.require_user()?;
    let events = ctx.events();

    match cmd {
        EventsCommand::List {
            status,
            search,
            mine,
            participating,
            page,
        } => {
            let list = if mine {
                events.my_events().await?
            } else if participating {
                events.participating().await?
            } else {
                let filter = EventFilter {
                    status,
                    search,
                    page,
                    ..Default::default()
                };
                let page = events.list(&filter).await?;
                if page.has_next() && !ctx.json {
                    ctx.print_info(&format!(
                        "Showing {} of {} events; use --page for more.",
                        page.results.len(),
                        page.count
                    ));
                }
                page.results
            };

            if ctx.emit_json(&list)? {
                return Ok(());
            }
            if list.is_empty() {
                ctx.print_info("No events found.");
            }
            for event in &list {
                println!(
                    "  {:>5}  {:<40} {:<10} closes {}",
                    event.id,
                    format::truncate(&event.name, 40),
                    format::event_status(event.status),
                    format::datetime(event.closes_at)
                );
            }
        }

        EventsCommand::Show { id } => {
            let (event, sessions, stats) = tokio::try_join!(
                async { Ok::<_, anyhow::Error>(events.get(id).await?) },
                event_sessions(&events, id),
                async { Ok::<_, anyhow::Error>(events.session_stats(id).await?) },
            )?;

            if ctx.emit_json(&serde_json::json!({
                "event": event,
                "session_stats": stats,
            }))? {
                return Ok(());
            }

            let now = Utc::now();
            ctx.print_header(&event.name);
            if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
                println!("  {}", description);
            }
            println!("  {:<16} {}", "Status", format::event_status(event.status));
            println!(
                "  {:<16} {}",
                "Now",
                format::current_status(event_current_status(&event, &sessions, now))
            );
            if let Some(owner) = &event.owner {
                println!("  {:<16} {}", "Organizer", owner.display_name());
            }
            println!("  {:<16} {}", "Registration", format::datetime(event.registration_ends_at));
            println!("  {:<16} {}", "Closes", format::datetime(event.closes_at));
            println!("  {:<16} {}", "Participants", event.participants_count);
            println!(
                "  {:<16} {} online ({} upcoming), {} offline ({} upcoming)",
                "Sessions",
                stats.online.total,
                stats.online.upcoming,
                stats.offline.total,
                stats.offline.upcoming
            );
            print_sessions(ctx, &sessions);
        }

        EventsCommand::Join { id } => {
            let response = events.join(id).await?;
            ctx.print_success(response.text().unwrap_or("Registered."));
        }

        EventsCommand::Leave { id } => {
            let response = events.leave(id).await?;
            ctx.print_success(response.text().unwrap_or("Registration withdrawn."));
        }

        EventsCommand::Create {
            name,
            description,
            registration_ends_at,
            closes_at,
            publish,
            private,
        } => {
            let input = EventInput {
                name: Some(name),
                description,
                status: Some(if publish {
                    EventStatus::Published
                } else {
                    EventStatus::Draft
                }),
                closes_at,
                registration_ends_at,
                is_private: Some(private),
                ..Default::default()
            };
            let event = events.create(&input).await?;
            if !ctx.emit_json(&event)? {
                ctx.print_success(&format!("Created event #{} {}", event.id, event.name));
            }
        }

        EventsCommand::Delete { id, yes } => {
            let event = events.get(id).await.context("Event not found")?;
            if !yes && !ctx.confirm(&format!("Delete event \"{}\"?", event.name), false)? {
                ctx.print_warning("Cancelled.");
                return Ok(());
            }
            events.delete(id).await?;
            ctx.print_success(&format!("Deleted event #{}", id));
        }

        EventsCommand::Participants { id } => {
            let participants = events.participants(id).await?;
            if ctx.emit_json(&participants)? {
                return Ok(());
            }
            if participants.is_empty() {
                ctx.print_info("No participants yet.");
            }
            for p in &participants {
                let name = p
                    .user
                    .as_ref()
                    .map(|u| u.display_name())
                    .or_else(|| p.user_name.clone())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:>5}  {:<32} {:<12} confirmed: {}  registered {}",
                    p.id,
                    format::truncate(&name, 32),
                    p.role.as_str(),
                    format::yes_no(p.is_confirmed),
                    format::datetime(p.registered_at)
                );
            }
        }

        EventsCommand::Sessions { id, upcoming } => {
            let sessions = if upcoming {
                events.upcoming_sessions(id).await?.into_sessions()
            } else {
                event_sessions(&events, id).await?
            };
            if ctx.json {
                let online: Vec<_> = sessions
                    .iter()
                    .filter_map(|s| match s {
                        Session::Online(o) => Some(o),
                        Session::Offline(_) => None,
                    })
                    .collect();
                let offline: Vec<_> = sessions
                    .iter()
                    .filter_map(|s| match s {
                        Session::Offline(o) => Some(o),
                        Session::Online(_) => None,
                    })
                    .collect();
                ctx.emit_json(&serde_json::json!({ "online": online, "offline": offline }))?;
                return Ok(());
            }
            print_sessions(ctx, &sessions);
        }

        EventsCommand::Attend { session_id } => {
            let attendance = events.join_session(session_id).await?;
            if !ctx.emit_json(&attendance)? {
                ctx.print_success(&format!(
                    "Attendance #{}: {}",
                    attendance.id,
                    attendance.status.label()
                ));
            }
        }

        EventsCommand::Unattend { session_id } => {
            let response = events.leave_session(session_id).await?;
            ctx.print_success(response.text().unwrap_or("Attendance cancelled."));
        }

        EventsCommand::Attendances { session_id } => {
            let attendances = events.session_attendances(session_id).await?;
            if ctx.emit_json(&attendances)? {
                return Ok(());
            }
            if attendances.is_empty() {
                ctx.print_info("Nobody has registered for this session.");
            }
            for a in &attendances {
                let name = a
                    .participant
                    .as_ref()
                    .map(|u| u.display_name())
                    .unwrap_or_else(|| "-".to_string());
                let minutes = a.duration_seconds.map(|s| format!("{} min", s / 60)).unwrap_or_default();
                println!(
                    "  {:>5}  {:<32} {:<10} joined {}  {}",
                    a.id,
                    format::truncate(&name, 32),
                    a.status.label(),
                    format::datetime(a.joined_at),
                    minutes.dimmed()
                );
            }
        }

        EventsCommand::Materials { session_id } => {
            let materials = events.session_materials(session_id).await?;
            if ctx.emit_json(&materials)? {
                return Ok(());
            }
            if materials.is_empty() {
                ctx.print_info("No materials published for this session.");
            }
            for m in &materials {
                println!(
                    "  {:>5}  {:<36} {:<12} {}",
                    m.id,
                    format::truncate(&m.title, 36),
                    m.material_type.as_str(),
                    m.location().unwrap_or("-").dimmed()
                );
            }
        }

        EventsCommand::Confirm { participation_id } => {
            let participation = events.confirm_participation(participation_id).await?;
            ctx.print_success(&format!("Confirmed participation #{}", participation.id));
        }
    }
    Ok(())
}

fn print_sessions(ctx: &AppContext, sessions: &[Session]) {
    ctx.print_header("Sessions");
    if sessions.is_empty() {
        ctx.print_info("No sessions scheduled.");
        return;
    }

    let now = Utc::now();
    for session in sessions {
        let place = match session {
            Session::Online(s) => s.platform.clone().or_else(|| s.link.clone()),
            Session::Offline(s) => s.location(),
        }
        .unwrap_or_default();

        let timing = if session.is_cancelled() {
            "Cancelled".red()
        } else {
            format::timing(timing_of(session, now))
        };

        println!(
            "  {}  {:<8} {:<32} {:<12} {}",
            format::datetime(session.start_time()),
            session.kind(),
            format::truncate(session.title(), 32),
            timing,
            place.dimmed()
        );
    }
}

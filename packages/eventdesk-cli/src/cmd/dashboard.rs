//! Role-based overview

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use eventdesk_client::{
    event_current_status, timing_of, Event, EventFilter, EventsService, Scheduled, Session, SessionTiming,
    User, UserFilter,
};
use serde_json::json;

use crate::context::AppContext;
use crate::format;

const LATEST_EVENTS: u32 = 5;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let user = ctx.require_user()?;
    if user.is_admin() {
        admin_dashboard(ctx, &user).await
    } else {
        participant_dashboard(ctx, &user).await
    }
}

async fn admin_dashboard(ctx: &AppContext, user: &User) -> Result<()> {
    let users = ctx.users();
    let events = ctx.events();
    let notifications = ctx.notifications();

    let user_filter = UserFilter {
        page_size: Some(1),
        ..Default::default()
    };
    let event_filter = EventFilter {
        ordering: Some("-created_at".to_string()),
        page_size: Some(LATEST_EVENTS),
        ..Default::default()
    };

    let (user_page, event_page, unread) = tokio::join!(
        users.list(&user_filter),
        events.list(&event_filter),
        notifications.unread_count_or_zero(),
    );
    let user_page = user_page?;
    let event_page = event_page?;

    if ctx.emit_json(&json!({
        "users": user_page.count,
        "events": event_page.count,
        "unread_notifications": unread,
        "latest_events": event_page.results,
    }))? {
        return Ok(());
    }

    ctx.print_header(&format!("Admin dashboard · {}", user.display_name()));
    println!("  {:<22} {}", "Users", user_page.count.to_string().bold());
    println!("  {:<22} {}", "Events", event_page.count.to_string().bold());
    println!("  {:<22} {}", "Unread notifications", unread.to_string().bold());

    ctx.print_header("Latest events");
    if event_page.results.is_empty() {
        ctx.print_info("No events yet.");
    }
    for event in &event_page.results {
        println!(
            "  {:>5}  {:<36} {:<10} {} participants",
            event.id,
            format::truncate(&event.name, 36),
            format::event_status(event.status),
            event.participants_count
        );
    }
    Ok(())
}

/// All sessions of one event, online and offline together.
pub async fn event_sessions(events: &EventsService, event_id: i64) -> Result<Vec<Session>> {
    let (online, offline) = tokio::try_join!(
        events.online_sessions(event_id),
        events.offline_sessions(event_id)
    )?;
    let mut sessions: Vec<Session> = online
        .into_iter()
        .map(Session::Online)
        .chain(offline.into_iter().map(Session::Offline))
        .collect();
    sessions.sort_by_key(|s| s.start_time());
    Ok(sessions)
}

async fn participant_dashboard(ctx: &AppContext, user: &User) -> Result<()> {
    let events = ctx.events();
    let notifications = ctx.notifications();
    let (participating, unread) = tokio::join!(
        events.participating(),
        notifications.unread_count_or_zero()
    );
    let participating = participating?;

    let now = Utc::now();
    let mut rows: Vec<(Event, Vec<Session>)> = Vec::with_capacity(participating.len());
    for event in participating {
        let sessions = event_sessions(&events, event.id).await?;
        rows.push((event, sessions));
    }

    if ctx.json {
        let payload: Vec<_> = rows
            .iter()
            .map(|(event, sessions)| {
                json!({
                    "event": event,
                    "current_status": event_current_status(event, sessions, now).label(),
                })
            })
            .collect();
        ctx.emit_json(&json!({ "events": payload, "unread_notifications": unread }))?;
        return Ok(());
    }

    ctx.print_header(&format!("My dashboard · {}", user.display_name()));
    println!("  {:<22} {}", "Unread notifications", unread.to_string().bold());

    ctx.print_header("My events");
    if rows.is_empty() {
        ctx.print_info("You are not registered for any events. Try `eventdesk events list`.");
    }
    for (event, sessions) in &rows {
        println!(
            "  {:>5}  {:<36} {}",
            event.id,
            format::truncate(&event.name, 36),
            format::current_status(event_current_status(event, sessions, now))
        );
    }

    let mut upcoming: Vec<(&Event, &Session)> = rows
        .iter()
        .flat_map(|(event, sessions)| sessions.iter().map(move |s| (event, s)))
        .filter(|(_, s)| {
            s.is_active() && !s.is_cancelled() && timing_of(*s, now) == Some(SessionTiming::Upcoming)
        })
        .collect();
    upcoming.sort_by_key(|(_, s)| s.start_time());

    ctx.print_header("Upcoming sessions");
    if upcoming.is_empty() {
        ctx.print_info("Nothing scheduled.");
    }
    for (event, session) in upcoming {
        println!(
            "  {}  {:<8} {} {}",
            format::datetime(session.start_time()),
            session.kind(),
            session.title().bold(),
            format!("({})", event.name).dimmed()
        );
    }
    Ok(())
}

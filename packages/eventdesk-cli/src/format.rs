//! Terminal formatting helpers.

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use eventdesk_client::{EventCurrentStatus, EventStatus, SessionTiming};

pub fn datetime(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn current_status(status: EventCurrentStatus) -> ColoredString {
    match status {
        EventCurrentStatus::Ongoing => status.label().green().bold(),
        EventCurrentStatus::RegistrationOpen => status.label().cyan(),
        EventCurrentStatus::Upcoming => status.label().blue(),
        EventCurrentStatus::Past => status.label().dimmed(),
    }
}

pub fn event_status(status: EventStatus) -> ColoredString {
    match status {
        EventStatus::Draft => status.label().yellow(),
        EventStatus::Published => status.label().green(),
        EventStatus::Cancelled => status.label().red(),
        EventStatus::Completed => status.label().dimmed(),
    }
}

pub fn timing(timing: Option<SessionTiming>) -> ColoredString {
    match timing {
        Some(SessionTiming::Ongoing) => "Ongoing".green().bold(),
        Some(SessionTiming::Upcoming) => "Upcoming".blue(),
        Some(SessionTiming::Past) => "Past".dimmed(),
        None => "Unscheduled".dimmed(),
    }
}

/// Cut to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".dimmed()
    }
}

//! Event and session status derived from timestamps.
//!
//! Everything here is a pure function of already-fetched data and a
//! caller-supplied `now`, so views and tests agree on the clock.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Event, Scheduled};

/// How long an open-ended session counts as ongoing after it starts.
pub const OPEN_ENDED_SESSION_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTiming {
    Upcoming,
    Ongoing,
    Past,
}

impl SessionTiming {
    pub fn label(&self) -> &'static str {
        match self {
            SessionTiming::Upcoming => "Upcoming",
            SessionTiming::Ongoing => "Ongoing",
            SessionTiming::Past => "Past",
        }
    }
}

/// Classify a session window. Exactly one variant applies for any `now`.
pub fn session_timing(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SessionTiming {
    if now < start {
        return SessionTiming::Upcoming;
    }
    match end {
        Some(end) if end < now => SessionTiming::Past,
        Some(_) => SessionTiming::Ongoing,
        None if now > start + Duration::hours(OPEN_ENDED_SESSION_HOURS) => SessionTiming::Past,
        None => SessionTiming::Ongoing,
    }
}

/// Timing of a scheduled item; `None` when it has no start time.
pub fn timing_of<S: Scheduled + ?Sized>(session: &S, now: DateTime<Utc>) -> Option<SessionTiming> {
    session
        .start_time()
        .map(|start| session_timing(start, session.end_time(), now))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCurrentStatus {
    Ongoing,
    RegistrationOpen,
    Upcoming,
    Past,
}

impl EventCurrentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EventCurrentStatus::Ongoing => "Ongoing",
            EventCurrentStatus::RegistrationOpen => "Registration open",
            EventCurrentStatus::Upcoming => "Upcoming",
            EventCurrentStatus::Past => "Past",
        }
    }
}

impl std::fmt::Display for EventCurrentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Registration is open when neither deadline has passed and the event is
/// still live.
pub fn registration_open(event: &Event, now: DateTime<Utc>) -> bool {
    let before_deadline = event.registration_ends_at.map_or(true, |t| now < t);
    let before_close = event.closes_at.map_or(true, |t| now < t);
    before_deadline && before_close && !event.status.is_final()
}

/// Checks, first match wins: a live session in progress, open registration,
/// a live upcoming session, then past. Sessions without a start time are
/// ignored.
pub fn event_current_status<S: Scheduled>(
    event: &Event,
    sessions: &[S],
    now: DateTime<Utc>,
) -> EventCurrentStatus {
    let timings: Vec<(bool, SessionTiming)> = sessions
        .iter()
        .filter_map(|s| timing_of(s, now).map(|t| (s.is_active() && !s.is_cancelled(), t)))
        .collect();

    if timings.iter().any(|&(live, t)| live && t == SessionTiming::Ongoing) {
        return EventCurrentStatus::Ongoing;
    }

    if registration_open(event, now) {
        return EventCurrentStatus::RegistrationOpen;
    }

    if timings.iter().any(|&(live, t)| live && t == SessionTiming::Upcoming) {
        return EventCurrentStatus::Upcoming;
    }

    let all_sessions_past =
        !timings.is_empty() && timings.iter().all(|&(_, t)| t == SessionTiming::Past);
    let closed = event.closes_at.is_some_and(|t| t <= now);

    if all_sessions_past || closed || event.status.is_final() {
        EventCurrentStatus::Past
    } else {
        EventCurrentStatus::Upcoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, OnlineSession, SessionStatus};
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    fn event(status: &str) -> Event {
        serde_json::from_value(json!({ "id": 1, "name": "Hackathon", "status": status })).unwrap()
    }

    fn session(start: u32, end: Option<u32>) -> OnlineSession {
        serde_json::from_value(json!({
            "id": 1,
            "session_name": "Kickoff",
            "start_time": at(start),
            "end_time": end.map(at),
            "status": "scheduled",
        }))
        .unwrap()
    }

    #[test]
    fn test_session_timing_bounded() {
        assert_eq!(session_timing(at(10), Some(at(12)), at(9)), SessionTiming::Upcoming);
        assert_eq!(session_timing(at(10), Some(at(12)), at(10)), SessionTiming::Ongoing);
        assert_eq!(session_timing(at(10), Some(at(12)), at(12)), SessionTiming::Ongoing);
        assert_eq!(session_timing(at(10), Some(at(12)), at(13)), SessionTiming::Past);
    }

    #[test]
    fn test_open_ended_session_expires_after_an_hour() {
        assert_eq!(session_timing(at(10), None, at(11)), SessionTiming::Ongoing);
        assert_eq!(
            session_timing(at(10), None, at(11) + Duration::minutes(1)),
            SessionTiming::Past
        );
    }

    #[test]
    fn test_ongoing_session_wins_over_open_registration() {
        let e = event("published");
        let status = event_current_status(&e, &[session(10, Some(12))], at(11));
        assert_eq!(status, EventCurrentStatus::Ongoing);
    }

    #[test]
    fn test_cancelled_session_is_not_ongoing() {
        let mut e = event("published");
        e.registration_ends_at = Some(at(8));
        let mut s = session(10, Some(12));
        s.status = Some(SessionStatus::Cancelled);

        assert_eq!(event_current_status(&e, &[s], at(11)), EventCurrentStatus::Upcoming);
    }

    #[test]
    fn test_registration_open_without_deadlines() {
        let e = event("published");
        let none: [OnlineSession; 0] = [];
        assert_eq!(event_current_status(&e, &none, at(9)), EventCurrentStatus::RegistrationOpen);
    }

    #[test]
    fn test_upcoming_after_registration_closed() {
        let mut e = event("published");
        e.registration_ends_at = Some(at(8));
        let status = event_current_status(&e, &[session(14, Some(15))], at(9));
        assert_eq!(status, EventCurrentStatus::Upcoming);
    }

    #[test]
    fn test_past_when_all_sessions_done() {
        let mut e = event("published");
        e.registration_ends_at = Some(at(8));
        let sessions = [session(9, Some(10)), session(10, None)];
        assert_eq!(event_current_status(&e, &sessions, at(15)), EventCurrentStatus::Past);
    }

    #[test]
    fn test_final_status_is_past() {
        let e = event("completed");
        assert_eq!(e.status, EventStatus::Completed);
        let none: [OnlineSession; 0] = [];
        assert_eq!(event_current_status(&e, &none, at(9)), EventCurrentStatus::Past);
    }

    #[test]
    fn test_closed_event_is_past() {
        let mut e = event("published");
        e.closes_at = Some(at(9));
        let none: [OnlineSession; 0] = [];
        assert!(!registration_open(&e, at(10)));
        assert_eq!(event_current_status(&e, &none, at(10)), EventCurrentStatus::Past);
    }
}

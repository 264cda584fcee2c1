use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file::EventFile;
use super::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Draft",
            EventStatus::Published => "Published",
            EventStatus::Cancelled => "Cancelled",
            EventStatus::Completed => "Completed",
        }
    }

    /// No further registrations or sessions are expected.
    pub fn is_final(&self) -> bool {
        matches!(self, EventStatus::Cancelled | EventStatus::Completed)
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "cancelled" => Ok(EventStatus::Cancelled),
            "completed" => Ok(EventStatus::Completed),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: EventStatus,
    #[serde(default)]
    pub owner: Option<UserSummary>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registration_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub participants_count: u64,
    #[serde(default)]
    pub online_sessions_count: u64,
    #[serde(default)]
    pub offline_sessions_count: u64,
    #[serde(default)]
    pub files_count: u64,
    #[serde(default)]
    pub upcoming_online_sessions: Vec<OnlineSession>,
    #[serde(default)]
    pub upcoming_offline_sessions: Vec<OfflineSession>,
    /// Attachments; only the detail view embeds them.
    #[serde(default)]
    pub files: Vec<EventFile>,
}

fn default_true() -> bool {
    true
}

impl Event {
    pub fn sessions_count(&self) -> u64 {
        self.online_sessions_count + self.offline_sessions_count
    }
}

/// Create/update payload for an event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub is_active: Option<bool>,
    pub owner: Option<i64>,
    pub search: Option<String>,
    pub closes_after: Option<DateTime<Utc>>,
    pub closes_before: Option<DateTime<Utc>>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

/// Anything with a start/end window the status derivation can reason about.
pub trait Scheduled {
    fn start_time(&self) -> Option<DateTime<Utc>>;
    fn end_time(&self) -> Option<DateTime<Utc>>;
    fn is_active(&self) -> bool;
    fn is_cancelled(&self) -> bool;
    fn title(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineSession {
    pub id: i64,
    #[serde(default)]
    pub event_id: Option<i64>,
    pub session_name: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_notes: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub attendees_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineSession {
    pub id: i64,
    #[serde(default)]
    pub event_id: Option<i64>,
    pub session_name: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_notes: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub full_location: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Scheduled for OnlineSession {
    fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_cancelled(&self) -> bool {
        self.status == Some(SessionStatus::Cancelled)
    }

    fn title(&self) -> &str {
        &self.session_name
    }
}

impl Scheduled for OfflineSession {
    fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_cancelled(&self) -> bool {
        self.status == Some(SessionStatus::Cancelled)
    }

    fn title(&self) -> &str {
        &self.session_name
    }
}

impl OfflineSession {
    pub fn location(&self) -> Option<String> {
        if let Some(full) = self.full_location.as_ref().filter(|s| !s.is_empty()) {
            return Some(full.clone());
        }
        match (&self.address, &self.room) {
            (Some(a), Some(r)) => Some(format!("{}, {}", a, r)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(r)) => Some(r.clone()),
            (None, None) => None,
        }
    }
}

/// Online or offline session, for mixed lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Online(OnlineSession),
    Offline(OfflineSession),
}

impl Session {
    fn inner(&self) -> &dyn Scheduled {
        match self {
            Session::Online(s) => s,
            Session::Offline(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Session::Online(_) => "online",
            Session::Offline(_) => "offline",
        }
    }
}

impl Scheduled for Session {
    fn start_time(&self) -> Option<DateTime<Utc>> {
        self.inner().start_time()
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        self.inner().end_time()
    }

    fn is_active(&self) -> bool {
        self.inner().is_active()
    }

    fn is_cancelled(&self) -> bool {
        self.inner().is_cancelled()
    }

    fn title(&self) -> &str {
        self.inner().title()
    }
}

/// Scheduled, active sessions of one event that have not started yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpcomingSessions {
    #[serde(default)]
    pub online_sessions: Vec<OnlineSession>,
    #[serde(default)]
    pub offline_sessions: Vec<OfflineSession>,
    #[serde(default)]
    pub total_upcoming: u64,
}

impl UpcomingSessions {
    /// Both kinds in one list, earliest first.
    pub fn into_sessions(self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .online_sessions
            .into_iter()
            .map(Session::Online)
            .chain(self.offline_sessions.into_iter().map(Session::Offline))
            .collect();
        sessions.sort_by_key(|s| s.start_time());
        sessions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Registered,
    Joined,
    Left,
    Completed,
    NoShow,
}

impl AttendanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Registered => "Registered",
            AttendanceStatus::Joined => "Joined",
            AttendanceStatus::Left => "Left",
            AttendanceStatus::Completed => "Completed",
            AttendanceStatus::NoShow => "No-show",
        }
    }
}

/// One participant's attendance of an online session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAttendance {
    pub id: i64,
    #[serde(default)]
    pub session: Option<OnlineSession>,
    #[serde(default)]
    pub participant: Option<UserSummary>,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub left_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Presentation,
    Document,
    Video,
    Audio,
    Link,
    Other,
}

impl MaterialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Presentation => "presentation",
            MaterialType::Document => "document",
            MaterialType::Video => "video",
            MaterialType::Audio => "audio",
            MaterialType::Link => "link",
            MaterialType::Other => "other",
        }
    }
}

/// Public material attached to an online session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMaterial {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub material_type: MaterialType,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_display: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<UserSummary>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

impl SessionMaterial {
    /// Uploaded file first, external link otherwise.
    pub fn location(&self) -> Option<&str> {
        self.file
            .as_deref()
            .or(self.file_url.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Participant,
    Speaker,
    Organizer,
    Volunteer,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Participant => "participant",
            ParticipantRole::Speaker => "speaker",
            ParticipantRole::Organizer => "organizer",
            ParticipantRole::Volunteer => "volunteer",
        }
    }
}

/// A user's registration against an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: i64,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default = "default_participant_role")]
    pub role: ParticipantRole,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_confirmed: bool,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
}

fn default_participant_role() -> ParticipantRole {
    ParticipantRole::Participant
}

impl Participation {
    pub fn event_id(&self) -> Option<i64> {
        self.event.as_ref().map(|e| e.id)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticipationFilter {
    pub event: Option<i64>,
    pub user: Option<i64>,
    pub role: Option<ParticipantRole>,
    pub is_confirmed: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGroupStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub upcoming: u64,
    #[serde(default)]
    pub ongoing: u64,
    #[serde(default)]
    pub completed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub online: SessionGroupStats,
    #[serde(default)]
    pub offline: SessionGroupStats,
    #[serde(default)]
    pub has_online_sessions: bool,
    #[serde(default)]
    pub has_offline_sessions: bool,
}

/// Reply of join/leave style actions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ActionResponse {
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.detail.as_deref())
            .or(self.status.as_deref())
    }
}

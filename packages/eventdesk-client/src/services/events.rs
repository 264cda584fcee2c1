use serde_json::json;

use super::{fetch_all, fetch_page};
use crate::endpoints::{self, detail, detail_action};
use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{
    ActionResponse, Event, EventFilter, EventInput, OfflineSession, OnlineSession, Paginated,
    Participation, ParticipationFilter, SessionAttendance, SessionMaterial, SessionStats,
    UpcomingSessions,
};
use crate::query::QueryParams;

#[derive(Clone)]
pub struct EventsService {
    client: ApiClient,
}

impl EventsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub async fn list(&self, filter: &EventFilter) -> Result<Paginated<Event>> {
        let query = QueryParams::new()
            .push("status", filter.status.map(|s| s.as_str()))
            .push("is_active", filter.is_active)
            .push("owner", filter.owner)
            .push("search", filter.search.clone())
            .push("closes_at__gte", filter.closes_after)
            .push("closes_at__lte", filter.closes_before)
            .push("ordering", filter.ordering.clone())
            .push("page", filter.page)
            .push("page_size", filter.page_size);
        fetch_page(&self.client, endpoints::EVENTS, query).await
    }

    pub async fn get(&self, id: i64) -> Result<Event> {
        self.client.get(&detail(endpoints::EVENTS, id)).await
    }

    pub async fn create(&self, input: &EventInput) -> Result<Event> {
        self.client.post(endpoints::EVENTS, input).await
    }

    pub async fn update(&self, id: i64, input: &EventInput) -> Result<Event> {
        self.client.patch(&detail(endpoints::EVENTS, id), input).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&detail(endpoints::EVENTS, id)).await
    }

    pub async fn join(&self, id: i64) -> Result<ActionResponse> {
        self.client
            .post(&detail_action(endpoints::EVENTS, id, "join"), &json!({}))
            .await
    }

    pub async fn leave(&self, id: i64) -> Result<ActionResponse> {
        self.client
            .post(&detail_action(endpoints::EVENTS, id, "leave"), &json!({}))
            .await
    }

    pub async fn participants(&self, id: i64) -> Result<Vec<Participation>> {
        fetch_all(&self.client, &detail_action(endpoints::EVENTS, id, "participants")).await
    }

    /// Events owned by the current user.
    pub async fn my_events(&self) -> Result<Vec<Event>> {
        fetch_all(&self.client, endpoints::EVENTS_MY).await
    }

    /// Events the current user is registered for.
    pub async fn participating(&self) -> Result<Vec<Event>> {
        fetch_all(&self.client, endpoints::EVENTS_PARTICIPATING).await
    }

    pub async fn upcoming(&self) -> Result<Vec<Event>> {
        fetch_all(&self.client, endpoints::EVENTS_UPCOMING).await
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub async fn online_sessions(&self, event_id: i64) -> Result<Vec<OnlineSession>> {
        fetch_all(&self.client, &detail_action(endpoints::EVENTS, event_id, "online_sessions")).await
    }

    pub async fn offline_sessions(&self, event_id: i64) -> Result<Vec<OfflineSession>> {
        fetch_all(&self.client, &detail_action(endpoints::EVENTS, event_id, "offline_sessions")).await
    }

    pub async fn session_stats(&self, event_id: i64) -> Result<SessionStats> {
        self.client
            .get(&detail_action(endpoints::EVENTS, event_id, "session_stats"))
            .await
    }

    pub async fn upcoming_sessions(&self, event_id: i64) -> Result<UpcomingSessions> {
        self.client
            .get(&detail_action(endpoints::EVENTS, event_id, "upcoming_sessions"))
            .await
    }

    /// Register attendance for an online session. The server answers with the
    /// attendance record, `joined` when the session is already running.
    pub async fn join_session(&self, session_id: i64) -> Result<SessionAttendance> {
        self.client
            .post(&detail_action(endpoints::ONLINE_SESSIONS, session_id, "join"), &json!({}))
            .await
    }

    pub async fn leave_session(&self, session_id: i64) -> Result<ActionResponse> {
        self.client
            .post(&detail_action(endpoints::ONLINE_SESSIONS, session_id, "leave"), &json!({}))
            .await
    }

    pub async fn session_attendances(&self, session_id: i64) -> Result<Vec<SessionAttendance>> {
        fetch_all(&self.client, &detail_action(endpoints::ONLINE_SESSIONS, session_id, "attendances")).await
    }

    /// Public materials of an online session.
    pub async fn session_materials(&self, session_id: i64) -> Result<Vec<SessionMaterial>> {
        fetch_all(&self.client, &detail_action(endpoints::ONLINE_SESSIONS, session_id, "materials")).await
    }

    // =========================================================================
    // Participations
    // =========================================================================

    pub async fn participations(&self, filter: &ParticipationFilter) -> Result<Paginated<Participation>> {
        let query = QueryParams::new()
            .push("event", filter.event)
            .push("user", filter.user)
            .push("role", filter.role.map(|r| r.as_str()))
            .push("is_confirmed", filter.is_confirmed)
            .push("page", filter.page)
            .push("page_size", filter.page_size);
        fetch_page(&self.client, endpoints::EVENT_PARTICIPANTS, query).await
    }

    pub async fn confirm_participation(&self, id: i64) -> Result<Participation> {
        self.client
            .patch(&detail(endpoints::EVENT_PARTICIPANTS, id), &json!({ "is_confirmed": true }))
            .await
    }

    pub async fn remove_participation(&self, id: i64) -> Result<()> {
        self.client.delete(&detail(endpoints::EVENT_PARTICIPANTS, id)).await
    }
}

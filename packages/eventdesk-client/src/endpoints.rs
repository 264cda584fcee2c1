//! API paths, relative to the configured base URL.

pub const LOGIN: &str = "/api/v1/login/";
pub const TOKEN_REFRESH: &str = "/api/v1/token/refresh/";

pub const USERS: &str = "/api/v1/users/";
pub const PROFILE: &str = "/api/v1/users/me/";
pub const LOGOUT: &str = "/api/v1/users/logout/";
pub const CHANGE_PASSWORD: &str = "/api/v1/users/change_password/";

pub const EVENTS: &str = "/api/v1/events/";
pub const EVENTS_MY: &str = "/api/v1/events/my_events/";
pub const EVENTS_PARTICIPATING: &str = "/api/v1/events/participating/";
pub const EVENTS_UPCOMING: &str = "/api/v1/events/upcoming/";
pub const EVENT_PARTICIPANTS: &str = "/api/v1/event-participants/";
pub const ONLINE_SESSIONS: &str = "/api/v1/online-sessions/";
pub const OFFLINE_SESSIONS: &str = "/api/v1/offline-sessions/";

pub const NOTIFICATIONS: &str = "/api/v1/user/notifications/";
pub const NOTIFICATIONS_UNREAD_COUNT: &str = "/api/v1/user/notifications/unread_count/";
pub const NOTIFICATIONS_MARK_ALL: &str = "/api/v1/user/notifications/mark_all_as_read/";
pub const NOTIFICATIONS_DELETE_READ: &str = "/api/v1/user/notifications/delete_all_read/";

pub const FILES: &str = "/api/v1/files/files/";
pub const FILES_UPLOAD: &str = "/api/v1/files/files/upload/";
pub const FILES_UPLOAD_MULTIPLE: &str = "/api/v1/files/files/upload_multiple/";
pub const FILES_SEARCH: &str = "/api/v1/files/files/search/";
pub const SHARE_LINKS: &str = "/api/v1/files/share-links/";

/// `{collection}{id}/` for a collection path ending in `/`.
pub fn detail(collection: &str, id: i64) -> String {
    format!("{}{}/", collection, id)
}

/// `{collection}{key}/{action}/` for resources looked up by a string key.
pub fn keyed_action(collection: &str, key: &str, action: &str) -> String {
    format!("{}{}/{}/", collection, key, action)
}

/// `{collection}{id}/{action}/`.
pub fn detail_action(collection: &str, id: i64, action: &str) -> String {
    format!("{}{}/{}/", collection, id, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_paths() {
        assert_eq!(detail(EVENTS, 5), "/api/v1/events/5/");
        assert_eq!(
            detail_action(NOTIFICATIONS, 7, "mark_as_read"),
            "/api/v1/user/notifications/7/mark_as_read/"
        );
    }
}

//! JSON payloads shaped like the backend's serializers.

use eventdesk_client::User;
use serde_json::{json, Value};

pub fn user_json(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@example.com", id),
        "first_name": "Ada",
        "last_name": "Lovelace",
        "full_name": "Ada Lovelace",
        "role": role,
        "is_active": true,
        "is_staff": role == "admin",
        "permissions": [],
    })
}

pub fn user(id: i64, role: &str) -> User {
    serde_json::from_value(user_json(id, role)).unwrap()
}

pub fn event_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "status": "published",
        "owner": { "id": 1, "email": "user1@example.com", "full_name": "Ada Lovelace" },
        "participants_count": 10,
        "online_sessions_count": 1,
        "offline_sessions_count": 0,
    })
}

pub fn file_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "original_name": name,
        "category": "document",
        "file_size": 2048,
        "file_size_display": "2.0 KB",
        "is_public": true,
        "uploaded_by": 7,
    })
}

/// An attachment as embedded in the event detail.
pub fn event_file_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "category": "document",
        "description": "",
        "is_public": true,
        "file_name": name,
        "file_size": 4096,
        "file_size_display": "4.0 KB",
        "file_url": format!("/media/{}", name),
        "display_order": 0,
    })
}

/// A DRF page whose `count` says `count` but which carries a single row.
pub fn page_of_count(count: u64) -> Value {
    json!({
        "count": count,
        "next": if count > 1 { json!("http://testserver/?page=2") } else { Value::Null },
        "previous": null,
        "results": [{ "id": 1 }],
    })
}

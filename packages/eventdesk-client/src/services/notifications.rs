use serde_json::json;
use tracing::warn;

use super::fetch_all;
use crate::endpoints::{self, detail, detail_action};
use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{ActionResponse, DeletedCount, MarkedCount, Notification, UnreadCount};

/// Notifications of the current user.
///
/// The `*_or_*` variants never fail: errors are logged and the neutral value
/// is returned.
#[derive(Clone)]
pub struct NotificationsService {
    client: ApiClient,
}

impl NotificationsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Notification>> {
        fetch_all(&self.client, endpoints::NOTIFICATIONS).await
    }

    pub async fn unread_count(&self) -> Result<u64> {
        let UnreadCount { count } = self.client.get(endpoints::NOTIFICATIONS_UNREAD_COUNT).await?;
        Ok(count)
    }

    pub async fn mark_as_read(&self, id: i64) -> Result<ActionResponse> {
        self.client
            .post(&detail_action(endpoints::NOTIFICATIONS, id, "mark_as_read"), &json!({}))
            .await
    }

    /// Returns how many notifications changed state.
    pub async fn mark_all_as_read(&self) -> Result<u64> {
        let MarkedCount { marked_count } = self
            .client
            .post(endpoints::NOTIFICATIONS_MARK_ALL, &json!({}))
            .await?;
        Ok(marked_count)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&detail(endpoints::NOTIFICATIONS, id)).await
    }

    /// Returns how many read notifications were removed.
    pub async fn delete_all_read(&self) -> Result<u64> {
        let request = ApiRequest::delete(endpoints::NOTIFICATIONS_DELETE_READ);
        let DeletedCount { deleted_count } = self.client.send(request).await?;
        Ok(deleted_count)
    }

    pub async fn list_or_empty(&self) -> Vec<Notification> {
        self.list().await.unwrap_or_else(|error| {
            warn!(%error, "Failed to load notifications");
            Vec::new()
        })
    }

    pub async fn unread_count_or_zero(&self) -> u64 {
        self.unread_count().await.unwrap_or_else(|error| {
            warn!(%error, "Failed to load unread notification count");
            0
        })
    }

    pub async fn mark_all_as_read_or_zero(&self) -> u64 {
        self.mark_all_as_read().await.unwrap_or_else(|error| {
            warn!(%error, "Failed to mark notifications as read");
            0
        })
    }
}

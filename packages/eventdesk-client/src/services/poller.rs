use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::NotificationsService;
use crate::models::Notification;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

/// Background refresh of the notification bell.
///
/// The first fetch happens immediately. Dropping the poller stops the task.
pub struct NotificationPoller {
    snapshots: watch::Receiver<NotificationSnapshot>,
    handle: JoinHandle<()>,
}

impl NotificationPoller {
    pub fn spawn(service: NotificationsService, interval: Duration) -> Self {
        let (tx, snapshots) = watch::channel(NotificationSnapshot::default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let (notifications, unread_count) =
                    tokio::join!(service.list_or_empty(), service.unread_count_or_zero());
                debug!(count = notifications.len(), unread_count, "Polled notifications");

                let snapshot = NotificationSnapshot {
                    notifications,
                    unread_count,
                };
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        Self { snapshots, handle }
    }

    pub fn latest(&self) -> NotificationSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshots.clone()
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

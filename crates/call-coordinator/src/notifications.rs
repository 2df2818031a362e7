//! Join/leave notifications.
//!
//! Reconnect churn produces repeated join/leave events for the same person;
//! the queue suppresses an identical `(kind, user name)` pair inside a
//! rolling dedup window. Accepted items stay visible for a fixed display
//! duration, independent of the dedup window.

use std::collections::HashMap;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Joined,
    Left,
}

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub user_name: String,
    posted_at: Instant,
}

/// Deduplicated notification queue with timed visibility.
#[derive(Debug)]
pub struct NotificationQueue {
    dedup_window: Duration,
    display_duration: Duration,
    last_accepted: HashMap<(NotificationKind, String), Instant>,
    items: Vec<NotificationItem>,
}

impl NotificationQueue {
    #[must_use]
    pub fn new(dedup_window: Duration, display_duration: Duration) -> Self {
        Self {
            dedup_window,
            display_duration,
            last_accepted: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// Post a notification. Returns false when an identical pair was
    /// accepted inside the dedup window and this one was suppressed.
    pub fn notify(&mut self, kind: NotificationKind, user_name: &str) -> bool {
        let now = Instant::now();
        let key = (kind, user_name.to_string());

        if let Some(previous) = self.last_accepted.get(&key) {
            if now.duration_since(*previous) < self.dedup_window {
                return false;
            }
        }

        self.last_accepted.insert(key, now);
        self.items.push(NotificationItem {
            id: Uuid::new_v4(),
            kind,
            user_name: user_name.to_string(),
            posted_at: now,
        });
        true
    }

    /// Currently visible notifications; expired items are pruned first.
    pub fn visible(&mut self) -> &[NotificationItem] {
        let now = Instant::now();
        let display = self.display_duration;
        self.items
            .retain(|item| now.duration_since(item.posted_at) < display);
        &self.items
    }
}

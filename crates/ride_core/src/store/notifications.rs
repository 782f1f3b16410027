use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DriverFound,
    DriverArriving,
    DriverArrived,
    RideStarted,
    RideCompleted,
    PaymentProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideNotification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Wall-clock milliseconds.
    pub timestamp: i64,
    pub read: bool,
}

/// In-memory notification feed, newest first.
#[derive(Debug, Default, Resource)]
pub struct NotificationStore {
    notifications: Vec<RideNotification>,
    next_seq: u64,
}

impl NotificationStore {
    pub fn notifications(&self) -> &[RideNotification] {
        &self.notifications
    }

    pub fn add(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: i64,
    ) -> String {
        let id = format!("{timestamp}-{}", self.next_seq);
        self.next_seq += 1;
        self.notifications.insert(
            0,
            RideNotification {
                id: id.clone(),
                kind,
                title: title.into(),
                message: message.into(),
                timestamp,
                read: false,
            },
        );
        id
    }

    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_as_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn latest(&self, kind: NotificationKind) -> Option<&RideNotification> {
        self.notifications.iter().find(|n| n.kind == kind)
    }
}

//! Transient, dismissible notifications ("toasts").

use std::collections::VecDeque;

/// Oldest notifications are dropped beyond this many.
pub const MAX_NOTIFICATIONS: usize = 8;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Identifier used to dismiss it.
    pub id: u64,
    /// Severity.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
}

/// Bounded queue of pending notifications.
#[derive(Debug, Default)]
pub struct Notifications {
    queue: VecDeque<Notification>,
    next_id: u64,
}

impl Notifications {
    /// Queues a notification and returns its id.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;

        if self.queue.len() == MAX_NOTIFICATIONS {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            id,
            level,
            message: message.into(),
        });

        id
    }

    /// Removes the notification with `id`. Returns whether it was present.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.queue.len();
        self.queue.retain(|n| n.id != id);
        self.queue.len() != before
    }

    /// Pending notifications, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    /// Removes and returns every pending notification.
    pub fn take(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    /// Number of pending notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_dismiss() {
        let mut notifications = Notifications::default();
        let a = notifications.push(NotificationLevel::Success, "Heatmap loaded successfully!");
        let b = notifications.push(NotificationLevel::Error, "Failed to load heatmap data");

        assert!(notifications.dismiss(a));
        assert!(!notifications.dismiss(a));
        let remaining: Vec<u64> = notifications.iter().map(|n| n.id).collect();
        assert_eq!(remaining, [b]);
    }

    #[test]
    fn bounded() {
        let mut notifications = Notifications::default();
        for i in 0..20 {
            notifications.push(NotificationLevel::Success, format!("n{i}"));
        }
        assert_eq!(notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(notifications.iter().next().unwrap().message, "n12");
    }

    #[test]
    fn take_drains() {
        let mut notifications = Notifications::default();
        notifications.push(NotificationLevel::Success, "done");
        assert_eq!(notifications.take().len(), 1);
        assert!(notifications.is_empty());
    }
}

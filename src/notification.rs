use serde::Serialize;

pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct NotificationHandle(pub u64);

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationHandle,
    pub message: String,
    pub severity: Severity,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

/// Single-slot message area: posting replaces whatever is showing and every
/// message disappears once its display duration has passed.
#[derive(Debug)]
pub struct NotificationBus {
    duration_ms: u64,
    next_id: u64,
    active: Option<Notification>,
}

impl NotificationBus {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms: duration_ms.max(1),
            next_id: 1,
            active: None,
        }
    }

    pub fn post(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now_ms: u64,
    ) -> &Notification {
        let id = NotificationHandle(self.next_id);
        self.next_id += 1;
        if let Some(replaced) = self.active.take() {
            tracing::trace!(replaced = replaced.id.0, "notification replaced");
        }
        self.active.insert(Notification {
            id,
            message: message.into(),
            severity,
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(self.duration_ms),
        })
    }

    /// Removes the active notification once it is due, returning its handle.
    pub fn expire(&mut self, now_ms: u64) -> Option<NotificationHandle> {
        let due = self
            .active
            .as_ref()
            .is_some_and(|active| now_ms >= active.expires_at_ms);
        if !due {
            return None;
        }
        self.active.take().map(|expired| expired.id)
    }

    pub fn current(&self, now_ms: u64) -> Option<&Notification> {
        self.active
            .as_ref()
            .filter(|active| now_ms < active.expires_at_ms)
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_expires_after_duration() {
        let mut bus = NotificationBus::default();
        let handle = bus.post("⏱ Stopwatch started!", Severity::Info, 1_000).id;
        assert_eq!(bus.current(3_999).map(|n| n.id), Some(handle));
        assert_eq!(bus.expire(3_999), None);

        assert!(bus.current(4_000).is_none());
        assert_eq!(bus.expire(4_000), Some(handle));
        assert_eq!(bus.expire(5_000), None);
    }

    #[test]
    fn latest_post_replaces_the_slot() {
        let mut bus = NotificationBus::default();
        let first = bus.post("first", Severity::Info, 0).id;
        let second = bus.post("second", Severity::Error, 2_000).id;
        assert_ne!(first, second);

        let current = bus.current(2_500).expect("active");
        assert_eq!(current.message, "second");
        assert_eq!(current.severity, Severity::Error);

        // The replacement carries its own full duration.
        assert_eq!(bus.expire(3_000), None);
        assert_eq!(bus.expire(5_000), Some(second));
    }

    #[test]
    fn clear_empties_the_slot() {
        let mut bus = NotificationBus::new(500);
        bus.post("gone soon", Severity::Info, 0);
        bus.clear();
        assert!(bus.current(0).is_none());
        assert_eq!(bus.expire(1_000), None);
    }
}

use std::time::{Duration, Instant};

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation or greeting.
    Info,
    /// A failed submission or rejected intent.
    Error,
}

/// Transient banner shown above the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text to display.
    pub message: String,
    /// Severity.
    pub level: NoticeLevel,
    expires_at: Instant,
}

impl Notification {
    pub(crate) fn new(message: String, level: NoticeLevel, ttl: Duration) -> Self {
        Self {
            message,
            level,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Whether the notification should no longer be shown at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

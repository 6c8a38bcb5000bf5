use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// whole seconds since the unix epoch
pub type Timestamp = i64;

/// longest message an alarm keeps, anything after this is dropped
pub const MESSAGE_CAPACITY: usize = 63;

static UID: AtomicU64 = AtomicU64::new(0);

/// hands out alarm ids, only used for naming threads and logging
pub fn next_id() -> u64 {
    UID.fetch_add(1, Ordering::Relaxed) + 1
}

/// alarm text, never longer than [`MESSAGE_CAPACITY`] chars
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message(String);

impl Message {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let end = text
            .char_indices()
            .nth(MESSAGE_CAPACITY)
            .map_or(text.len(), |(i, _)| i);
        Self(text[..end].to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// represents an alarm
/// contains the time that the alarm should go off at and what to say while waiting.
/// once a worker takes an alarm nothing else ever looks at it again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: u64,
    /// the delay that was asked for, kept for logging
    pub seconds: i64,
    pub expires_at: Timestamp,
    pub message: Message,
}

impl Alarm {
    /// an alarm going off `seconds` after `now`, `None` if that overflows
    #[must_use]
    pub fn new(now: Timestamp, seconds: i64, message: Message) -> Option<Self> {
        Some(Self {
            id: next_id(),
            seconds,
            expires_at: now.checked_add(seconds)?,
            message,
        })
    }

    #[must_use]
    pub const fn is_due(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_capped() {
        let long = "x".repeat(100);
        assert_eq!(Message::new(&long).as_str().len(), MESSAGE_CAPACITY);
        assert_eq!(Message::new("hello").as_str(), "hello");
    }

    #[test]
    fn message_cap_counts_chars_not_bytes() {
        let long = "é".repeat(70);
        let message = Message::new(&long);
        assert_eq!(message.as_str().chars().count(), MESSAGE_CAPACITY);
    }

    #[test]
    fn expiry_is_submission_plus_delay() {
        let alarm = Alarm::new(100, 5, Message::new("hello")).unwrap();
        assert_eq!(alarm.expires_at, 105);
        assert!(!alarm.is_due(104));
        assert!(alarm.is_due(105));
    }

    #[test]
    fn negative_delay_is_already_due() {
        let alarm = Alarm::new(100, -3, Message::new("late")).unwrap();
        assert!(alarm.is_due(100));
    }

    #[test]
    fn overflowing_delay_is_rejected() {
        assert!(Alarm::new(i64::MAX, 1, Message::new("never")).is_none());
    }

    #[test]
    fn ids_increase() {
        let a = next_id();
        let b = next_id();
        assert!(b > a);
    }
}

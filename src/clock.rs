use std::{
    sync::atomic::{AtomicI64, Ordering},
    thread,
    time::Duration,
};

use crate::alarm::Timestamp;

/// where the scheduler gets the time from and how it waits
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
    fn sleep(&self, duration: Duration);
}

/// the real wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// a clock that only moves when something sleeps on it (or it is moved by hand).
/// sleeping jumps the time forward instead of blocking, rounded up to whole seconds
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        let whole = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        self.advance(i64::try_from(whole.max(1)).unwrap_or(i64::MAX));
        // let the other threads see the new time
        thread::yield_now();
    }
}

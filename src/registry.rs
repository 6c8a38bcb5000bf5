//! The shared, time ordered list of pending alarms.
//!
//! One mutex guards both the alarms and the "no more input" flag, the
//! dispatcher decides whether to stop by looking at the two together.
//! Every method takes the lock exactly once and never holds it past return.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use log::debug;

use crate::{
    alarm::{Alarm, Timestamp},
    error::{Error, Result},
};

/// what the dispatcher should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// the earliest alarm, now owned by the caller
    Ready { alarm: Alarm, input_closed: bool },
    /// nothing queued but more input may still come
    Idle,
    /// nothing queued and nothing ever will be
    Closed,
}

/// counters for checking that no alarm gets lost or handed out twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub inserted: u64,
    pub popped: u64,
    pub pending: usize,
}

#[derive(Debug, Default)]
struct State {
    alarms: VecDeque<Alarm>,
    done: bool,
    inserted: u64,
    popped: u64,
}

impl State {
    fn pop(&mut self) -> Option<Alarm> {
        let alarm = self.alarms.pop_front()?;
        self.popped += 1;
        Some(alarm)
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<State>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::LockPoisoned("alarm registry"))
    }

    /// Queues an alarm behind every alarm expiring at or before it.
    ///
    /// Alarms with the same expiry therefore come out in the order they went in.
    pub fn insert(&self, alarm: Alarm) -> Result<()> {
        let mut state = self.lock()?;
        let at = state
            .alarms
            .partition_point(|queued| queued.expires_at <= alarm.expires_at);
        debug!(
            "queueing alarm {} ({}) at position {at} of {}",
            alarm.id,
            alarm.expires_at,
            state.alarms.len()
        );
        state.alarms.insert(at, alarm);
        state.inserted += 1;
        Ok(())
    }

    /// Removes the earliest alarm whether or not it is due yet.
    pub fn pop_ready(&self) -> Result<Option<Alarm>> {
        Ok(self.lock()?.pop())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.alarms.is_empty())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.alarms.len())
    }

    /// Marks the end of input. Calling it again changes nothing.
    pub fn close(&self) -> Result<()> {
        self.lock()?.done = true;
        Ok(())
    }

    pub fn is_closed(&self) -> Result<bool> {
        Ok(self.lock()?.done)
    }

    /// pop the head or say why there isn't one, in one critical section
    pub fn poll(&self) -> Result<Poll> {
        let mut state = self.lock()?;
        Ok(match state.pop() {
            Some(alarm) => Poll::Ready {
                alarm,
                input_closed: state.done,
            },
            None if state.done => Poll::Closed,
            None => Poll::Idle,
        })
    }

    /// expiry times in queue order
    pub fn expirations(&self) -> Result<Vec<Timestamp>> {
        Ok(self
            .lock()?
            .alarms
            .iter()
            .map(|alarm| alarm.expires_at)
            .collect())
    }

    pub fn stats(&self) -> Result<RegistryStats> {
        let state = self.lock()?;
        Ok(RegistryStats {
            inserted: state.inserted,
            popped: state.popped,
            pending: state.alarms.len(),
        })
    }
}

//! One thread per alarm.
//!
//! A worker owns its alarm outright once the dispatcher hands it over, so
//! there is no locking in here. It ticks once per interval until the alarm
//! is due, reports the expiry and drops the alarm along with the thread.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::debug;

use crate::{
    alarm::Alarm,
    clock::Clock,
    error::{Error, Result},
    report::{Report, Reporter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Counting,
    Expired,
}

pub struct Worker {
    alarm: Alarm,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    tick: Duration,
}

impl Worker {
    #[must_use]
    pub fn new(
        alarm: Alarm,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn Reporter>,
        tick: Duration,
    ) -> Self {
        Self {
            alarm,
            clock,
            reporter,
            tick,
        }
    }

    /// Checks the alarm once and reports on it, without waiting.
    pub fn step(&self) -> WorkerState {
        let now = self.clock.now();
        if self.alarm.is_due(now) {
            self.reporter.report(&Report::Expired {
                at: now,
                expires_at: self.alarm.expires_at,
                message: self.alarm.message.clone(),
            });
            WorkerState::Expired
        } else {
            self.reporter.report(&Report::Tick {
                expires_at: self.alarm.expires_at,
                message: self.alarm.message.clone(),
            });
            WorkerState::Counting
        }
    }

    /// Counts down until the alarm expires. The first check happens before
    /// any sleep, so an alarm that is already due expires straight away.
    pub fn run(self) {
        while self.step() == WorkerState::Counting {
            self.clock.sleep(self.tick);
        }
        debug!(
            "alarm {} expired (asked for {}s)",
            self.alarm.id, self.alarm.seconds
        );
    }

    /// runs the worker on its own thread, named after the alarm
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("alarm-{}", self.alarm.id))
            .spawn(move || self.run())
            .map_err(|source| Error::Spawn {
                what: "alarm",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alarm::Message,
        clock::ManualClock,
        report::MemoryReporter,
    };

    fn worker(now: i64, seconds: i64) -> (Worker, Arc<ManualClock>, Arc<MemoryReporter>) {
        let clock = Arc::new(ManualClock::new(now));
        let reporter = Arc::new(MemoryReporter::new());
        let alarm = Alarm::new(now, seconds, Message::new("hello")).unwrap();
        let worker = Worker::new(
            alarm,
            clock.clone(),
            reporter.clone(),
            Duration::from_secs(1),
        );
        (worker, clock, reporter)
    }

    fn ticks(reports: &[Report]) -> usize {
        reports
            .iter()
            .filter(|report| matches!(report, Report::Tick { .. }))
            .count()
    }

    #[test]
    fn counts_down_then_expires() {
        let (worker, clock, reporter) = worker(0, 5);
        worker.run();
        let reports = reporter.reports();
        assert_eq!(ticks(&reports), 5);
        assert_eq!(
            reports.last(),
            Some(&Report::Expired {
                at: 5,
                expires_at: 5,
                message: Message::new("hello"),
            })
        );
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn due_alarm_expires_without_sleeping() {
        let (worker, clock, reporter) = worker(100, 0);
        worker.run();
        assert_eq!(reporter.reports().len(), 1);
        assert!(matches!(reporter.reports()[0], Report::Expired { at: 100, .. }));
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn overdue_alarm_expires_at_once() {
        let (worker, _clock, reporter) = worker(100, -10);
        assert_eq!(worker.step(), WorkerState::Expired);
        assert!(matches!(
            reporter.reports()[0],
            Report::Expired {
                at: 100,
                expires_at: 90,
                ..
            }
        ));
    }

    #[test]
    fn step_ticks_while_waiting() {
        let (worker, clock, reporter) = worker(0, 2);
        assert_eq!(worker.step(), WorkerState::Counting);
        clock.advance(2);
        assert_eq!(worker.step(), WorkerState::Expired);
        assert_eq!(ticks(&reporter.reports()), 1);
    }

    #[test]
    fn spawned_worker_finishes() {
        let (worker, _clock, reporter) = worker(0, 3);
        worker.spawn().unwrap().join().unwrap();
        assert!(matches!(
            reporter.reports().last(),
            Some(Report::Expired { .. })
        ));
    }
}

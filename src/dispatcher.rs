//! Moves alarms out of the registry and onto their own worker threads.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info};

use crate::{
    clock::Clock,
    error::{Error, Result},
    registry::{Poll, Registry},
    report::{Report, Reporter},
    worker::Worker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// how long to wait when the registry is empty but input is still open
    pub idle: Duration,
    /// how often workers tick
    pub tick: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(1),
            tick: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Running,
    /// input has ended, whatever is left gets dispatched
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub dispatched: usize,
    /// workers that died instead of reporting an expiry
    pub panicked: usize,
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    config: DispatcherConfig,
    workers: Vec<JoinHandle<()>>,
    state: DispatcherState,
    on_fatal: Option<fn(&Error)>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn Reporter>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            clock,
            reporter,
            config,
            workers: Vec::new(),
            state: DispatcherState::Running,
            on_fatal: None,
        }
    }

    /// called on the dispatcher thread if it fails, before the error is returned
    #[must_use]
    pub fn on_fatal(mut self, handler: fn(&Error)) -> Self {
        self.on_fatal = Some(handler);
        self
    }

    #[must_use]
    pub const fn state(&self) -> DispatcherState {
        self.state
    }

    /// Dispatches alarms until input has ended and the registry is empty,
    /// then waits for every worker it started.
    ///
    /// The registry lock is only held inside [`Registry::poll`], never while
    /// a worker starts or while idling.
    pub fn run(mut self) -> Result<DispatchSummary> {
        info!("dispatcher starting");
        let mut summary = DispatchSummary::default();
        loop {
            match self.registry.poll()? {
                Poll::Ready {
                    alarm,
                    input_closed,
                } => {
                    if input_closed && self.state == DispatcherState::Running {
                        info!("input closed, draining");
                        self.state = DispatcherState::Draining;
                    }
                    self.reporter.report(&Report::Retrieved {
                        at: self.clock.now(),
                        expires_at: alarm.expires_at,
                        message: alarm.message.clone(),
                    });
                    debug!("starting worker for alarm {}", alarm.id);
                    let worker = Worker::new(
                        alarm,
                        Arc::clone(&self.clock),
                        Arc::clone(&self.reporter),
                        self.config.tick,
                    );
                    self.workers.push(worker.spawn()?);
                    summary.dispatched += 1;
                    summary.panicked += self.reap(false);
                }
                Poll::Idle => {
                    summary.panicked += self.reap(false);
                    self.clock.sleep(self.config.idle);
                }
                Poll::Closed => break,
            }
        }
        self.state = DispatcherState::Stopped;
        info!(
            "registry drained after {} alarms, waiting on {} workers",
            summary.dispatched,
            self.workers.len()
        );
        summary.panicked += self.reap(true);
        info!("dispatcher stopped");
        Ok(summary)
    }

    /// Joins finished workers, or all of them with `wait`. Returns how many panicked.
    fn reap(&mut self, wait: bool) -> usize {
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition(|handle| wait || handle.is_finished());
        self.workers = running;
        done.into_iter()
            .filter_map(|handle| {
                let name = handle.thread().name().unwrap_or("alarm").to_string();
                handle.join().err().map(|_| name)
            })
            .inspect(|name| error!("worker {name} panicked"))
            .count()
    }

    pub fn spawn(self) -> Result<JoinHandle<Result<DispatchSummary>>> {
        let on_fatal = self.on_fatal;
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || {
                let result = self.run();
                if let (Err(e), Some(handler)) = (&result, on_fatal) {
                    handler(e);
                }
                result
            })
            .map_err(|source| Error::Spawn {
                what: "dispatcher",
                source,
            })
    }
}

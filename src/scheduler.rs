use std::{io::BufRead, sync::Arc};

use log::info;

use crate::{
    clock::Clock,
    dispatcher::{DispatchSummary, Dispatcher, DispatcherConfig},
    error::{Error, Result},
    ingest::{ingest, IngestSummary},
    registry::{Registry, RegistryStats},
    report::Reporter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub ingest: IngestSummary,
    pub dispatch: DispatchSummary,
    pub registry: RegistryStats,
}

/// Owns the registry and wires the ingestion loop to the dispatcher.
pub struct Scheduler {
    registry: Arc<Registry>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    config: DispatcherConfig,
    abort_on_fatal: bool,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: DispatcherConfig, clock: Arc<dyn Clock>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            clock,
            reporter,
            config,
            abort_on_fatal: false,
        }
    }

    /// Ends the process as soon as the dispatcher fails instead of waiting
    /// for input to run out first.
    #[must_use]
    pub fn abort_on_fatal(mut self) -> Self {
        self.abort_on_fatal = true;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Starts the dispatcher, feeds it every request in `input` from this
    /// thread, then waits until the last alarm has expired.
    pub fn run<R: BufRead>(&self, input: R) -> Result<Summary> {
        let mut dispatcher = Dispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.clock),
            Arc::clone(&self.reporter),
            self.config,
        );
        if self.abort_on_fatal {
            dispatcher = dispatcher.on_fatal(|e| crate::error::abort(e));
        }
        let dispatcher = dispatcher.spawn()?;

        let ingested = ingest(input, &self.registry, &*self.clock, &*self.reporter);
        if ingested.is_err() {
            // still let the dispatcher stop, it would otherwise idle forever
            let _ = self.registry.close();
        }
        let ingest = ingested?;

        let dispatch = dispatcher
            .join()
            .map_err(|_| Error::Join("dispatcher"))??;
        let registry = self.registry.stats()?;
        info!(
            "all alarms done: {} received, {} dispatched",
            registry.inserted, dispatch.dispatched
        );
        Ok(Summary {
            ingest,
            dispatch,
            registry,
        })
    }
}

//! Fatal errors of the alarm scheduler.
//!
//! Everything in here means the runtime itself is broken: a poisoned lock,
//! a thread that could not be started, an unusable config. None of these
//! are recoverable, the binary logs them and exits. Bad user input is not
//! an [`Error`], see [`crate::request::ParseError`].

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum Error {
    /// A thread panicked while holding the named lock.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// The OS refused to start a thread.
    #[error("couldn't create {what} thread: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} thread panicked")]
    Join(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Logs `error` and ends the process. There is no way to carry on after a
/// poisoned lock or a thread that wouldn't start.
pub fn abort(error: &Error) -> ! {
    log::error!("fatal: {error}");
    eprintln!("fatal: {error}");
    std::process::exit(1)
}

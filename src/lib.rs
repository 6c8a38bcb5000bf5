#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! A command line alarm scheduler.
//!
//! Requests (`<seconds> <message>`) are read one line at a time and queued in a
//! [`registry::Registry`] sorted by expiry. A dispatcher thread takes alarms off
//! the front as soon as they show up and gives each one its own
//! [`worker::Worker`] thread, which counts down once a second and reports when
//! the alarm expires.

pub mod alarm;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ingest;
pub mod registry;
pub mod report;
pub mod request;
pub mod scheduler;
pub mod worker;

pub use error::{Error, Result};
pub use scheduler::{Scheduler, Summary};

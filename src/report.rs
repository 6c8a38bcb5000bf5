use std::{
    fmt::Write as _,
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Local,
};

use crate::alarm::{Message, Timestamp};

/// the default time format, seconds since the epoch
pub const EPOCH_SECONDS: &str = "%s";

/// everything the scheduler tells the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Received {
        at: Timestamp,
        expires_at: Timestamp,
        message: Message,
    },
    Retrieved {
        at: Timestamp,
        expires_at: Timestamp,
        message: Message,
    },
    Tick {
        expires_at: Timestamp,
        message: Message,
    },
    Expired {
        at: Timestamp,
        expires_at: Timestamp,
        message: Message,
    },
    BadCommand {
        line: String,
        reason: String,
    },
}

impl Report {
    /// the line printed for this report, times rendered with `time_format`
    #[must_use]
    pub fn render(&self, time_format: &str) -> String {
        let time = |ts: &Timestamp| format_time(*ts, time_format);
        match self {
            Self::Received {
                at,
                expires_at,
                message,
            } => format!("Alarm Received at {}:{} {message}", time(at), time(expires_at)),
            Self::Retrieved {
                at,
                expires_at,
                message,
            } => format!("Alarm Retrieved at {}:{} {message}", time(at), time(expires_at)),
            Self::Tick {
                expires_at,
                message,
            } => format!("Alarm:{} {message}", time(expires_at)),
            Self::Expired {
                at,
                expires_at,
                message,
            } => format!("Alarm Expired at {}:{} {message}", time(at), time(expires_at)),
            Self::BadCommand { .. } => "Bad command".to_string(),
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Received { message, .. }
            | Self::Retrieved { message, .. }
            | Self::Tick { message, .. }
            | Self::Expired { message, .. } => Some(message),
            Self::BadCommand { .. } => None,
        }
    }
}

/// whether chrono can render `format`
#[must_use]
pub fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// renders a timestamp in local time, falling back to raw seconds
#[must_use]
pub fn format_time(ts: Timestamp, format: &str) -> String {
    let Some(utc) = DateTime::from_timestamp(ts, 0) else {
        return ts.to_string();
    };
    let mut out = String::new();
    if write!(out, "{}", utc.with_timezone(&Local).format(format)).is_err() {
        return ts.to_string();
    }
    out
}

/// somewhere to send reports, shared by every thread of the scheduler
pub trait Reporter: Send + Sync {
    fn report(&self, report: &Report);

    /// called right before waiting for the next request
    fn prompt(&self) {}
}

/// prints reports to stdout and bad commands to stderr
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    time_format: String,
    prompt: Option<String>,
}

impl ConsoleReporter {
    #[must_use]
    pub fn new(time_format: impl Into<String>, prompt: Option<String>) -> Self {
        Self {
            time_format: time_format.into(),
            prompt,
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(EPOCH_SECONDS, Some("alarm> ".to_string()))
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, report: &Report) {
        let line = report.render(&self.time_format);
        // a closed stdout shouldn't take the alarms down with it
        let _ = if matches!(report, Report::BadCommand { .. }) {
            writeln!(io::stderr().lock(), "{line}")
        } else {
            writeln!(io::stdout().lock(), "{line}")
        };
    }

    fn prompt(&self) {
        if let Some(prompt) = &self.prompt {
            let mut stdout = io::stdout().lock();
            let _ = write!(stdout, "{prompt}").and_then(|()| stdout.flush());
        }
    }
}

/// keeps every report in order of arrival
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
    prompts: Mutex<usize>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn prompts(&self) -> usize {
        *self.prompts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, report: &Report) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
    }

    fn prompt(&self) {
        *self.prompts.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

//! Reads alarm requests and queues them.

use std::io::{BufRead, ErrorKind};

use log::{debug, info, warn};

use crate::{
    alarm::Alarm,
    clock::Clock,
    error::Result,
    registry::Registry,
    report::{Report, Reporter},
    request::{parse_line, ParseError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub admitted: usize,
    pub rejected: usize,
    pub skipped: usize,
}

/// Reads requests from `input` until it runs out, then closes the registry.
///
/// Never waits on the alarms it queues. A read error counts as the end of
/// input, same as EOF.
pub fn ingest<R: BufRead>(
    mut input: R,
    registry: &Registry,
    clock: &dyn Clock,
    reporter: &dyn Reporter,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    let mut line = String::new();
    loop {
        reporter.prompt();
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                reject(reporter, "<not utf-8>", &ParseError::NotText);
                summary.rejected += 1;
                continue;
            }
            Err(e) => {
                warn!("couldn't read request, treating it as end of input: {e}");
                break;
            }
        }

        let request = match parse_line(&line) {
            Ok(Some(request)) => request,
            Ok(None) => {
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                reject(reporter, &line, &e);
                summary.rejected += 1;
                continue;
            }
        };

        let now = clock.now();
        let Some(alarm) = Alarm::new(now, request.seconds, request.message) else {
            reject(reporter, &line, &ParseError::Overflow);
            summary.rejected += 1;
            continue;
        };
        reporter.report(&Report::Received {
            at: now,
            expires_at: alarm.expires_at,
            message: alarm.message.clone(),
        });
        debug!("received alarm {} for {}s", alarm.id, alarm.seconds);
        registry.insert(alarm)?;
        summary.admitted += 1;
    }
    registry.close()?;
    info!(
        "input closed: {} admitted, {} rejected, {} blank",
        summary.admitted, summary.rejected, summary.skipped
    );
    Ok(summary)
}

fn reject(reporter: &dyn Reporter, line: &str, error: &ParseError) {
    let line = line.trim_end_matches(['\n', '\r']);
    warn!("bad command {line:?}: {error}");
    reporter.report(&Report::BadCommand {
        line: line.to_string(),
        reason: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use super::*;
    use crate::{clock::ManualClock, report::MemoryReporter};

    fn run(input: &str) -> (IngestSummary, Registry, MemoryReporter) {
        let registry = Registry::new();
        let reporter = MemoryReporter::new();
        let clock = ManualClock::new(0);
        let summary = ingest(Cursor::new(input.to_string()), &registry, &clock, &reporter).unwrap();
        (summary, registry, reporter)
    }

    #[test]
    fn admits_a_request() {
        let (summary, registry, reporter) = run("5 hello\n");
        assert_eq!(summary.admitted, 1);
        assert_eq!(registry.expirations().unwrap(), [5]);
        assert!(matches!(
            &reporter.reports()[..],
            [Report::Received {
                at: 0,
                expires_at: 5,
                ..
            }]
        ));
        assert!(registry.is_closed().unwrap());
    }

    #[test]
    fn bad_command_leaves_registry_alone() {
        let (summary, registry, reporter) = run("abc\n");
        assert_eq!(summary.rejected, 1);
        assert!(registry.is_empty().unwrap());
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert!(matches!(&reports[0], Report::BadCommand { line, .. } if line == "abc"));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let (summary, registry, reporter) = run("\n   \n\n");
        assert_eq!(summary.skipped, 3);
        assert!(registry.is_empty().unwrap());
        assert!(reporter.reports().is_empty());
    }

    #[test]
    fn empty_input_just_closes() {
        let (summary, registry, reporter) = run("");
        assert_eq!(summary, IngestSummary::default());
        assert!(registry.is_closed().unwrap());
        // one prompt before finding out there is nothing to read
        assert_eq!(reporter.prompts(), 1);
    }

    #[test]
    fn requests_are_queued_by_expiry() {
        let (_, registry, _) = run("10 first\n3 second\nnope\n7 third");
        assert_eq!(registry.expirations().unwrap(), [3, 7, 10]);
    }

    #[test]
    fn overflow_is_a_bad_command() {
        let registry = Registry::new();
        let reporter = MemoryReporter::new();
        let clock = ManualClock::new(i64::MAX - 1);
        let summary = ingest(Cursor::new("5 never"), &registry, &clock, &reporter).unwrap();
        assert_eq!(summary.rejected, 1);
        assert!(matches!(
            &reporter.reports()[0],
            Report::BadCommand { reason, .. } if *reason == ParseError::Overflow.to_string()
        ));
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "unplugged"))
        }
    }

    #[test]
    fn invalid_utf8_is_a_bad_command() {
        let registry = Registry::new();
        let reporter = MemoryReporter::new();
        let clock = ManualClock::new(0);
        let input: &[u8] = b"1 \xff\xfe\n2 fine\n";
        let summary = ingest(input, &registry, &clock, &reporter).unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.admitted, 1);
    }

    #[test]
    fn read_error_closes_input() {
        let registry = Registry::new();
        let reporter = MemoryReporter::new();
        let clock = ManualClock::new(0);
        let summary = ingest(io::BufReader::new(Broken), &registry, &clock, &reporter).unwrap();
        assert_eq!(summary, IngestSummary::default());
        assert!(registry.is_closed().unwrap());
    }
}

//! Parsing of `<seconds> <message>` request lines.

use thiserror::Error;

use crate::alarm::Message;

/// a parsed alarm request, not yet scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub seconds: i64,
    pub message: Message,
}

/// why a line is a bad command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("delay `{0}` is not a whole number of seconds")]
    InvalidDelay(String),
    #[error("no message after the delay")]
    MissingMessage,
    #[error("delay runs past the end of time")]
    Overflow,
    #[error("request is not valid UTF-8")]
    NotText,
}

/// Parses one input line.
///
/// Blank lines give `Ok(None)`. Otherwise the line is a signed integer delay,
/// whitespace, and a message running to the end of the line. The message keeps
/// its inner whitespace and is cut down to [`crate::alarm::MESSAGE_CAPACITY`].
pub fn parse_line(line: &str) -> Result<Option<Request>, ParseError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let line = line.trim_start();
    if line.is_empty() {
        return Ok(None);
    }

    let (delay, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let seconds = delay
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidDelay(delay.to_string()))?;

    let text = rest.trim_start();
    if text.is_empty() {
        return Err(ParseError::MissingMessage);
    }
    Ok(Some(Request {
        seconds,
        message: Message::new(text),
    }))
}

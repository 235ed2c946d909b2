//! Error results that can be returned from the parser

use crate::byte_stream::Location;
use std::fmt;
use thiserror::Error;

/// Parser error that defines an error (message) on the given position. Parse errors are never
/// fatal: the parser reports them and keeps going.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Parse error message (the WHATWG error code, eg: `eof-in-tag`)
    pub message: String,
    /// Location where the error starts
    pub location: Location,
    /// Location where the error ends
    pub end_location: Location,
}

impl ParseError {
    pub fn new(message: &str, location: Location) -> Self {
        Self {
            message: message.to_string(),
            location,
            end_location: location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.location.line, self.location.column, self.message)
    }
}

/// Serious errors. These are operational failures (bad input encoding, misuse of the API, io),
/// never HTML parse errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("utf8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("parser state error: {0}")]
    State(String),
}

/// Result that can be returned which holds either T or an Error
pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new("eof-in-tag", Location::new(3, 14, 40));
        assert_eq!(err.to_string(), "3:14: eof-in-tag");
        assert_eq!(err.location, err.end_location);
    }
}

//! Error types shared across the nowcast crates.

use thiserror::Error;

/// Result type alias using NowcastError.
pub type NowcastResult<T> = Result<T, NowcastError>;

/// Structural failures that make an upstream payload unusable.
///
/// These are the only sanitization outcomes surfaced to callers as
/// errors; field-level problems (non-numeric values, short arrays) are
/// always recovered inline and never reach this enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NowcastError {
    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Missing mandatory block: {0}")]
    MissingBlock(&'static str),

    #[error("Missing or non-finite coordinate: {0}")]
    InvalidCoordinate(&'static str),

    #[error("Unparseable timestamp: {0}")]
    InvalidTimestamp(String),
}

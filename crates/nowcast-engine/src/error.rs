//! Error types for the engine crate.
//!
//! Only two failure categories ever reach a caller: a structurally
//! unusable payload, and a fault inside the bounded computation host.
//! Everything else (invalid fields, failed injection validation,
//! alignment misses, deadline expiry) degrades the output in place.

use nowcast_common::NowcastError;
use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The raw payload failed structural validation and cannot be used
    /// at all.
    #[error("Unusable payload: {0}")]
    Unusable(#[from] NowcastError),

    /// The isolated injection task crashed. Unlike a deadline expiry,
    /// this indicates a real defect and is surfaced distinctly.
    #[error("Computation fault: {0}")]
    ComputationFault(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

//! Error types for the pipeline crate.

use nowcast_engine::EngineError;
use thiserror::Error;

/// Errors surfaced by the orchestration layer.
///
/// Per the degradation contract, only an unusable forecast payload, a
/// computation fault, or a failed forecast fetch reach the caller.
/// Air-quality, geocoding and high-resolution failures degrade the
/// bundle instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The forecast source itself could not be reached or returned
    /// garbage at the transport level.
    #[error("Forecast source failed: {0}")]
    Fetch(#[source] anyhow::Error),

    /// The core rejected the payload or faulted during injection.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

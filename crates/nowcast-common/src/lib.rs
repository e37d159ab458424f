//! Shared domain model for the weather nowcast pipeline.
//!
//! This crate holds the vocabulary every other crate speaks: WMO weather
//! codes and their families, the closed set of forecast model tokens,
//! the validated/normalized observation structures, and the time-key
//! utilities used to align independent model time grids. It contains no
//! I/O and no async code.

pub mod codes;
pub mod error;
pub mod models;
pub mod observations;
pub mod time;

// Re-exports
pub use error::{NowcastError, NowcastResult};
pub use models::{BoundingBox, ModelToken, HIGH_RES_COVERAGE};
pub use observations::{
    CurrentGroup, EffectiveConditionResult, NormalizedForecast, Provenance,
    ReliabilityAssessment, ReliabilityLevel, DivergenceType, SeriesGroup, SparseRecord,
    ValidatedObservationSet,
};

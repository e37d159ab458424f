//! Orchestration layer for the weather nowcast pipeline.
//!
//! Wires the fusion core to its collaborators: a multi-model forecast
//! fetcher, an air-quality fetcher, a reverse geocoder and a
//! read-through cache, all injected as traits. One call to
//! [`NowcastPipeline::nowcast`] yields a [`NowcastBundle`] that answers
//! per-instant condition queries and per-day reliability queries.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;

// Re-exports
pub use cache::{air_quality_cache_key, forecast_cache_key, CacheStats, KeyValueCache, MemoryCache};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use fetch::{AirQualityFetcher, ForecastFetcher, GeoPoint, Place, ReverseGeocoder, UnitSystem};
pub use pipeline::{instant_snapshot, rule_inputs, NowcastBundle, NowcastPipeline};

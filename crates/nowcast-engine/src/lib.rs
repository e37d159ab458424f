//! Fusion-and-correction core for the weather nowcast pipeline.
//!
//! Reconciles heterogeneous, partially overlapping, occasionally null
//! series from several forecast models into one internally consistent
//! nowcast. The stages, leaf first:
//!
//! - schema sanitization: arbitrary JSON → strict internal shape, never
//!   panicking;
//! - model normalization: suffixed fields → baseline + per-model
//!   comparison series;
//! - high-resolution injection: timestamp-aligned, additive-or-noop
//!   merge of a regional model, run inside a bounded computation host;
//! - the nowcast rule chain: effective weather code + corrected
//!   temperature for one instant;
//! - reliability scoring: per-day inter-model divergence tiers.
//!
//! A missing or malformed upstream field degrades the output; only a
//! structurally unusable payload or a fault inside the host surface as
//! errors.

pub mod config;
pub mod error;
pub mod host;
pub mod inject;
pub mod normalize;
pub mod reliability;
pub mod rules;
pub mod sanitize;

// Re-exports
pub use config::{EngineConfig, InjectionConfig, ReliabilityThresholds, RuleThresholds};
pub use error::{EngineError, Result};
pub use host::{run_bounded, run_bounded_injection, BoundedOutcome, HostOutcome};
pub use inject::inject_high_res;
pub use normalize::normalize;
pub use reliability::assess_reliability;
pub use rules::{compute_effective_condition, dew_point, InstantSnapshot, RuleInputs};
pub use sanitize::{sanitize, sanitize_partial};

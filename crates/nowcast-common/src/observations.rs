//! Core observation structures flowing through the pipeline.
//!
//! Every structure here is an owned, immutable value: each pipeline run
//! produces fresh instances and nothing is mutated in place after
//! construction, which is what lets the rule engine and scorer run
//! concurrently without locks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ModelToken;

/// Where the values of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Consensus baseline, untouched by the regional model.
    #[default]
    Consensus,
    /// One or more fields overwritten by the high-resolution model.
    HighResolution,
}

/// A group of parallel arrays keyed by a shared time axis.
///
/// Invariant (enforced by the sanitizer): every field array is no longer
/// than `time`. Short arrays are read as null-padded; the normalizer
/// pads them out physically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeriesGroup {
    pub time: Vec<String>,
    pub fields: BTreeMap<String, Vec<Option<f64>>>,
}

impl SeriesGroup {
    /// Number of time steps on the axis.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Value of a field at a time step, if present and numeric.
    pub fn value(&self, field: &str, index: usize) -> Option<f64> {
        self.fields.get(field)?.get(index).copied().flatten()
    }

    /// Mutable access to a field array, creating it null-filled to the
    /// time-axis length if absent.
    pub fn ensure_field(&mut self, field: &str) -> &mut Vec<Option<f64>> {
        let len = self.time.len();
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| vec![None; len])
    }

    /// Pad every field array with nulls out to the time-axis length.
    pub fn pad_to_time_len(&mut self) {
        let len = self.time.len();
        for values in self.fields.values_mut() {
            if values.len() < len {
                values.resize(len, None);
            }
        }
    }
}

/// The scalar `current` snapshot of a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CurrentGroup {
    /// Timestamp of the snapshot, when the upstream reported one.
    pub time: Option<String>,
    /// Finite numeric scalars only; everything else was dropped or
    /// defaulted during sanitization.
    pub fields: BTreeMap<String, f64>,
    /// Provenance tag, retagged by the high-resolution injector.
    pub provenance: Provenance,
}

impl CurrentGroup {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }

    pub fn set(&mut self, field: &str, value: f64) {
        self.fields.insert(field.to_string(), value);
    }
}

/// Output of the schema sanitizer: a structurally trustworthy payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedObservationSet {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub current: CurrentGroup,
    pub hourly: SeriesGroup,
    pub daily: SeriesGroup,
    /// Minute-resolution series (15-minute steps upstream).
    pub minutely: SeriesGroup,
}

/// One comparison model's contribution at a single time step.
pub type SparseRecord = BTreeMap<String, f64>;

/// The baseline consensus series plus per-model comparison series.
///
/// Invariant: for every model present, `hourly_comparison[model].len()`
/// equals `baseline.hourly.len()` (and likewise for daily). Record `i`
/// corresponds to `baseline.hourly.time[i]` by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub baseline: ValidatedObservationSet,
    pub hourly_comparison: BTreeMap<ModelToken, Vec<SparseRecord>>,
    pub daily_comparison: BTreeMap<ModelToken, Vec<SparseRecord>>,
}

/// The nowcast for exactly one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConditionResult {
    pub effective_code: i32,
    pub corrected_temperature: f64,
    pub provenance: Provenance,
}

/// Forecast confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityLevel {
    Low,
    Medium,
    High,
}

/// What kind of inter-model disagreement triggered the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceType {
    Temperature,
    Precipitation,
    General,
    Ok,
}

/// Inter-model agreement for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityAssessment {
    pub level: ReliabilityLevel,
    pub divergence: DivergenceType,
    /// The triggering difference, rounded to one decimal.
    pub magnitude: f64,
}

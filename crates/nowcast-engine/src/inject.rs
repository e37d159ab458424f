//! High-resolution injector: fuses a regional high-resolution payload
//! into the baseline forecast.
//!
//! Injection is strictly additive-or-noop. A null input, a payload that
//! fails the same structural validation as any other source, or a time
//! step with no truncated-hour match in the baseline all leave the
//! baseline exactly as it was. Values are only ever overwritten with
//! present, numeric high-resolution values, never nulled.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use nowcast_common::observations::NormalizedForecast;
use nowcast_common::time::hour_key;
use nowcast_common::Provenance;

use crate::config::InjectionConfig;
use crate::normalize::normalize;
use crate::sanitize::sanitize_partial;

/// `current`-snapshot fields the high-resolution model may override.
const CURRENT_OVERRIDE_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "is_day",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "wind_speed_10m",
    "wind_gusts_10m",
    "visibility",
];

/// Hourly-only additions to the override set.
const HOURLY_EXTRA_FIELDS: &[&str] = &["cape", "freezing_level_height"];

/// Merge a regional high-resolution payload into `baseline`.
///
/// Returns the baseline unchanged when `high_res` is `None` or fails
/// structural validation.
pub fn inject_high_res(
    mut baseline: NormalizedForecast,
    high_res: Option<&Value>,
    config: &InjectionConfig,
) -> NormalizedForecast {
    let Some(raw) = high_res else {
        return baseline;
    };

    // Same suffix cleaning and structural contract as any other
    // source, but without scalar defaulting: absent stays absent.
    let high = match sanitize_partial(raw) {
        Ok(set) => normalize(set),
        Err(err) => {
            warn!(error = %err, "high-resolution payload failed validation, keeping baseline");
            return baseline;
        }
    };

    // Truncated-hour key → baseline index. Independent models need not
    // share a time grid origin; zeroing minutes absorbs the offset.
    let index_by_hour: HashMap<String, usize> = baseline
        .baseline
        .hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, t)| hour_key(t).map(|key| (key, i)))
        .collect();

    inject_current(&mut baseline, &high);
    inject_hourly(&mut baseline, &high, &index_by_hour, config);

    // The minute-resolution series is replaced wholesale, not merged.
    if !high.baseline.minutely.is_empty() {
        baseline.baseline.minutely = high.baseline.minutely.clone();
    }

    baseline
}

fn inject_current(baseline: &mut NormalizedForecast, high: &NormalizedForecast) {
    let mut overridden = false;
    for field in CURRENT_OVERRIDE_FIELDS {
        if let Some(value) = high.baseline.current.get(field) {
            baseline.baseline.current.set(field, value);
            overridden = true;
        }
    }
    if overridden {
        baseline.baseline.current.provenance = Provenance::HighResolution;
        if let Some(time) = &high.baseline.current.time {
            baseline.baseline.current.time = Some(time.clone());
        }
    }
}

fn inject_hourly(
    baseline: &mut NormalizedForecast,
    high: &NormalizedForecast,
    index_by_hour: &HashMap<String, usize>,
    config: &InjectionConfig,
) {
    let fields: Vec<&str> = CURRENT_OVERRIDE_FIELDS
        .iter()
        .chain(HOURLY_EXTRA_FIELDS)
        .copied()
        .collect();

    for (step, time) in high.baseline.hourly.time.iter().enumerate() {
        let Some(index) = hour_key(time)
            .as_deref()
            .and_then(|key| index_by_hour.get(key).copied())
        else {
            // No positional alignment is attempted for unmatched steps.
            debug!(time, "high-resolution step has no baseline hour, dropping");
            continue;
        };

        for field in &fields {
            if let Some(value) = high.baseline.hourly.value(field, step) {
                baseline.baseline.hourly.ensure_field(field)[index] = Some(value);
            }
        }

        // Probability reinforcement: a regional model that sees a shower
        // the coarse consensus missed dominates the probability signal,
        // but only upward.
        if let Some(precip) = high.baseline.hourly.value("precipitation", step) {
            if precip >= config.precip_trace {
                let probs = baseline
                    .baseline
                    .hourly
                    .ensure_field("precipitation_probability");
                let current = probs[index].unwrap_or(0.0);
                if current < config.probability_floor {
                    probs[index] = Some(config.probability_floor);
                }
            }
        }
    }
}

//! Model normalizer: splits model-suffixed fields into the baseline
//! series plus per-model comparison series on a shared time axis.
//!
//! Routing rules, applied per field name:
//! - no recognized suffix, or the consensus suffix → baseline, under the
//!   de-suffixed name;
//! - a named comparison model suffix → that model's sparse per-timestep
//!   record at the same array index;
//! - any other recognized token (the regional model de-suffixing its own
//!   payload) → baseline.
//!
//! Unrecognized suffixes fail open into the baseline: data is preserved
//! over cleverness.

use tracing::debug;

use nowcast_common::models::{split_field_name, ModelToken};
use nowcast_common::observations::{
    NormalizedForecast, SeriesGroup, SparseRecord, ValidatedObservationSet,
};

/// Normalize a sanitized payload into baseline + comparison series.
pub fn normalize(set: ValidatedObservationSet) -> NormalizedForecast {
    let mut baseline = ValidatedObservationSet {
        latitude: set.latitude,
        longitude: set.longitude,
        elevation: set.elevation,
        current: Default::default(),
        hourly: SeriesGroup {
            time: set.hourly.time.clone(),
            ..Default::default()
        },
        daily: SeriesGroup {
            time: set.daily.time.clone(),
            ..Default::default()
        },
        minutely: SeriesGroup {
            time: set.minutely.time.clone(),
            ..Default::default()
        },
    };
    baseline.current.time = set.current.time.clone();
    baseline.current.provenance = set.current.provenance;

    // Comparison series are pre-sized to the baseline time axes so that
    // index i is always addressable, even for a model that contributed
    // nothing.
    let mut hourly_comparison = presized_comparison(set.hourly.len());
    let mut daily_comparison = presized_comparison(set.daily.len());

    for (name, value) in &set.current.fields {
        match split_field_name(name) {
            (base, Some(token)) if is_comparison(token) => {
                // The comparison structures are per-timestep only; a
                // scalar snapshot from a comparison model has no slot.
                debug!(field = base, model = %token, "dropping comparison-model current scalar");
            }
            (base, _) => baseline.current.set(base, *value),
        }
    }

    route_series(set.hourly, &mut baseline.hourly, Some(&mut hourly_comparison));
    route_series(set.daily, &mut baseline.daily, Some(&mut daily_comparison));
    route_series(set.minutely, &mut baseline.minutely, None);

    baseline.hourly.pad_to_time_len();
    baseline.daily.pad_to_time_len();
    baseline.minutely.pad_to_time_len();

    NormalizedForecast {
        baseline,
        hourly_comparison,
        daily_comparison,
    }
}

fn is_comparison(token: ModelToken) -> bool {
    ModelToken::COMPARISON.contains(&token)
}

fn presized_comparison(
    len: usize,
) -> std::collections::BTreeMap<ModelToken, Vec<SparseRecord>> {
    ModelToken::COMPARISON
        .into_iter()
        .map(|model| (model, vec![SparseRecord::new(); len]))
        .collect()
}

/// Route one series group's fields into the baseline and, when given,
/// the comparison records.
fn route_series(
    source: SeriesGroup,
    baseline: &mut SeriesGroup,
    mut comparison: Option<&mut std::collections::BTreeMap<ModelToken, Vec<SparseRecord>>>,
) {
    for (name, values) in source.fields {
        match split_field_name(&name) {
            (base, Some(token)) if is_comparison(token) => {
                let Some(comparison) = comparison.as_deref_mut() else {
                    debug!(field = base, model = %token, "dropping comparison field on axis without comparison series");
                    continue;
                };
                let records = comparison
                    .get_mut(&token)
                    .expect("comparison map pre-seeded with every comparison model");
                for (i, value) in values.into_iter().enumerate() {
                    if let (Some(v), Some(record)) = (value, records.get_mut(i)) {
                        record.insert(base.to_string(), v);
                    }
                }
            }
            (base, _) => {
                baseline.fields.insert(base.to_string(), values);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nowcast_common::observations::CurrentGroup;

    fn set_with_hourly(fields: &[(&str, Vec<Option<f64>>)]) -> ValidatedObservationSet {
        let mut hourly = SeriesGroup {
            time: vec![
                "2024-05-01T12:00".into(),
                "2024-05-01T13:00".into(),
                "2024-05-01T14:00".into(),
            ],
            ..Default::default()
        };
        for (name, values) in fields {
            hourly.fields.insert((*name).to_string(), values.clone());
        }
        ValidatedObservationSet {
            latitude: 41.9,
            longitude: 12.5,
            elevation: Some(21.0),
            current: CurrentGroup::default(),
            hourly,
            daily: SeriesGroup::default(),
            minutely: SeriesGroup::default(),
        }
    }

    #[test]
    fn consensus_suffix_lands_in_baseline() {
        let set = set_with_hourly(&[(
            "temperature_2m_best_match",
            vec![Some(20.0), Some(21.0), Some(22.0)],
        )]);
        let forecast = normalize(set);
        assert_eq!(forecast.baseline.hourly.value("temperature_2m", 1), Some(21.0));
    }

    #[test]
    fn comparison_suffix_lands_in_sparse_records() {
        let set = set_with_hourly(&[(
            "temperature_2m_gfs_global",
            vec![Some(19.0), None, Some(23.0)],
        )]);
        let forecast = normalize(set);

        let records = &forecast.hourly_comparison[&ModelToken::GfsGlobal];
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("temperature_2m"), Some(&19.0));
        assert!(records[1].is_empty());
        assert_eq!(records[2].get("temperature_2m"), Some(&23.0));
        // The comparison field does not leak into the baseline.
        assert!(forecast.baseline.hourly.fields.get("temperature_2m").is_none());
    }

    #[test]
    fn comparison_series_presized_even_without_data() {
        let set = set_with_hourly(&[]);
        let forecast = normalize(set);
        for model in ModelToken::COMPARISON {
            assert_eq!(forecast.hourly_comparison[&model].len(), 3);
        }
    }

    #[test]
    fn unrecognized_suffix_fails_open_into_baseline() {
        let set = set_with_hourly(&[(
            "temperature_2m_arpege_europe",
            vec![Some(18.0), None, None],
        )]);
        let forecast = normalize(set);
        assert_eq!(
            forecast.baseline.hourly.value("temperature_2m_arpege_europe", 0),
            Some(18.0)
        );
    }

    #[test]
    fn short_baseline_arrays_are_padded() {
        let set = set_with_hourly(&[("precipitation", vec![Some(0.5)])]);
        let forecast = normalize(set);
        assert_eq!(forecast.baseline.hourly.fields["precipitation"].len(), 3);
    }
}

//! Reliability scorer: quantifies disagreement between three
//! independent daily forecasts into a confidence tier.
//!
//! Checks run in a fixed order (temperature-high, precipitation-high,
//! either-medium) and the first breached threshold wins. The returned
//! magnitude is the triggering difference, rounded to one decimal.

use nowcast_common::observations::{DivergenceType, ReliabilityAssessment, ReliabilityLevel};

use crate::config::ReliabilityThresholds;

/// Assess inter-model agreement for one day.
///
/// `max_temps` and `precip_sums` hold the baseline plus the two named
/// comparison models, in any fixed order. A signal with fewer than two
/// present values cannot diverge and contributes no disagreement.
pub fn assess_reliability(
    max_temps: &[Option<f64>; 3],
    precip_sums: &[Option<f64>; 3],
    t: &ReliabilityThresholds,
) -> ReliabilityAssessment {
    let diff_temp = spread(max_temps);
    let diff_precip = spread(precip_sums);

    if diff_temp > t.temp_high {
        return assessment(ReliabilityLevel::Low, DivergenceType::Temperature, diff_temp);
    }
    if diff_precip > t.precip_high {
        return assessment(
            ReliabilityLevel::Low,
            DivergenceType::Precipitation,
            diff_precip,
        );
    }
    if diff_temp > t.temp_medium || diff_precip > t.precip_medium {
        let magnitude = if diff_temp > t.temp_medium {
            diff_temp
        } else {
            diff_precip
        };
        return assessment(ReliabilityLevel::Medium, DivergenceType::General, magnitude);
    }

    assessment(
        ReliabilityLevel::High,
        DivergenceType::Ok,
        diff_temp.max(diff_precip),
    )
}

/// Max minus min over the present values; zero when fewer than two
/// models reported.
fn spread(values: &[Option<f64>; 3]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut count = 0;
    for v in values.iter().flatten() {
        min = min.min(*v);
        max = max.max(*v);
        count += 1;
    }
    if count < 2 {
        0.0
    } else {
        max - min
    }
}

fn assessment(
    level: ReliabilityLevel,
    divergence: DivergenceType,
    magnitude: f64,
) -> ReliabilityAssessment {
    ReliabilityAssessment {
        level,
        divergence,
        magnitude: round1(magnitude),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

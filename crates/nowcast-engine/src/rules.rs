//! Nowcast rule engine: an ordered chain of corrections deriving the
//! effective present-weather code and a corrected temperature for one
//! instant.
//!
//! The chain is sequential (each step takes the previous step's code),
//! not a priority table. The engine is pure: every signal, including the
//! calendar month for the seasonal rule, is an explicit input, so
//! identical inputs always produce bit-identical results.

use nowcast_common::codes;
use nowcast_common::observations::EffectiveConditionResult;
use nowcast_common::Provenance;

use crate::config::RuleThresholds;

/// One instant's baseline (possibly high-resolution-injected) snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstantSnapshot {
    pub weather_code: i32,
    /// Near-surface temperature (degC).
    pub temperature: f64,
    /// Relative humidity (%).
    pub relative_humidity: f64,
    /// Cloud cover by vertical layer (%).
    pub cloud_cover_low: f64,
    pub cloud_cover_mid: f64,
    pub cloud_cover_high: f64,
    /// Wind speed (km/h).
    pub wind_speed: f64,
    /// Measured visibility (m), when the source reports one.
    pub visibility: Option<f64>,
    pub is_day: bool,
    /// Precipitation amount of the current hour (mm).
    pub hourly_precipitation: f64,
    pub provenance: Provenance,
}

/// Ancillary signals for the rule chain.
#[derive(Debug, Clone, Default)]
pub struct RuleInputs {
    /// Minute-resolution precipitation samples around the instant (mm).
    pub minutely_precipitation: Vec<f64>,
    /// Rain probability (%). Carried through the interface for the
    /// advisory layers; the correction chain itself does not consult it.
    pub rain_probability: Option<f64>,
    /// Freezing level height above sea level (m).
    pub freezing_level: Option<f64>,
    /// Terrain elevation above sea level (m).
    pub elevation: f64,
    /// Convective available potential energy (J/kg).
    pub cape: Option<f64>,
    /// Calendar month (1-12) of the instant, explicit for testability.
    pub month: u32,
}

/// Run the correction chain for one instant.
pub fn compute_effective_condition(
    snapshot: &InstantSnapshot,
    inputs: &RuleInputs,
    t: &RuleThresholds,
) -> EffectiveConditionResult {
    let cloud = effective_cloud_cover(snapshot, t);
    let mut code = base_sky_code(snapshot.weather_code, cloud, t);
    let precip = instantaneous_precipitation(snapshot, inputs);

    code = adjust_rain_intensity(code, precip, t);
    code = virga_filter(code, snapshot.relative_humidity, precip, cloud, t);
    code = fog_adjustment(code, snapshot, cloud, t);
    code = visibility_override(code, snapshot.visibility, precip, t);
    code = storm_adjustment(code, inputs.cape, cloud, precip, t);
    code = winter_conversion(code, snapshot.temperature, precip, inputs, t);

    EffectiveConditionResult {
        effective_code: code,
        corrected_temperature: corrected_temperature(snapshot, inputs.month, cloud, t),
        provenance: snapshot.provenance,
    }
}

/// Weighted combination of the cloud layers, capped at 100.
///
/// Low cloud dominates perceived sky condition, so it outweighs the mid
/// and high layers.
fn effective_cloud_cover(snapshot: &InstantSnapshot, t: &RuleThresholds) -> f64 {
    let weighted = snapshot.cloud_cover_low * t.cloud_weight_low
        + snapshot.cloud_cover_mid * t.cloud_weight_mid
        + snapshot.cloud_cover_high * t.cloud_weight_high;
    weighted.min(100.0)
}

/// Re-derive codes in the clear family purely from effective cloud
/// cover; anything outside that family passes through unchanged.
fn base_sky_code(code: i32, cloud: f64, t: &RuleThresholds) -> i32 {
    if !codes::is_clear_family(code) {
        return code;
    }
    if cloud < t.sky_clear_max {
        codes::CLEAR
    } else if cloud < t.sky_mostly_clear_max {
        codes::MOSTLY_CLEAR
    } else if cloud < t.sky_partly_max {
        codes::PARTLY_CLOUDY
    } else {
        codes::OVERCAST
    }
}

/// The strongest instantaneous precipitation signal available: the
/// maximum minute-resolution sample, or the current hourly amount when
/// no minute samples exist.
fn instantaneous_precipitation(snapshot: &InstantSnapshot, inputs: &RuleInputs) -> f64 {
    inputs
        .minutely_precipitation
        .iter()
        .copied()
        .fold(None, |max: Option<f64>, v| {
            Some(max.map_or(v, |m| m.max(v)))
        })
        .unwrap_or(snapshot.hourly_precipitation)
}

/// Escalate to a rain code matching the observed amount.
fn adjust_rain_intensity(code: i32, precip: f64, t: &RuleThresholds) -> i32 {
    if precip < t.precip_trace || codes::is_severe_storm(code) {
        return code;
    }
    if precip < t.rain_moderate_min {
        codes::RAIN_LIGHT
    } else if precip < t.rain_heavy_min {
        codes::RAIN_MODERATE
    } else {
        codes::RAIN_HEAVY
    }
}

/// Precipitation reported aloft in dry low-level air is assumed to
/// evaporate before reaching the surface; revert to a cloud-only state.
fn virga_filter(code: i32, humidity: f64, precip: f64, cloud: f64, t: &RuleThresholds) -> i32 {
    if codes::is_rain_family(code) && humidity < t.virga_humidity_max && precip < t.virga_amount_max
    {
        if cloud > 50.0 {
            codes::OVERCAST
        } else {
            codes::PARTLY_CLOUDY
        }
    } else {
        code
    }
}

/// Dew point via the Magnus-Tetens approximation.
pub fn dew_point(temperature: f64, relative_humidity: f64) -> f64 {
    const A: f64 = 17.27;
    const B: f64 = 237.7;
    let rh = (relative_humidity / 100.0).max(1e-3);
    let gamma = rh.ln() + A * temperature / (B + temperature);
    B * gamma / (A - gamma)
}

/// Saturated, cloudy low-level air reads as fog; humid air demotes a
/// fully clear sky to mostly clear.
fn fog_adjustment(code: i32, snapshot: &InstantSnapshot, cloud: f64, t: &RuleThresholds) -> i32 {
    if codes::is_precipitating(code) {
        return code;
    }

    let spread = snapshot.temperature - dew_point(snapshot.temperature, snapshot.relative_humidity);
    if spread < t.fog_spread_max && snapshot.relative_humidity > t.fog_humidity_min && cloud > 50.0
    {
        return codes::FOG;
    }

    if code == codes::CLEAR && snapshot.relative_humidity > t.clear_demote_humidity {
        return codes::MOSTLY_CLEAR;
    }

    code
}

/// Visibility sensor data outranks cloud-derived inference: fog-like
/// codes or critically poor visibility force the fog code while no
/// precipitation is active.
fn visibility_override(
    code: i32,
    visibility: Option<f64>,
    precip: f64,
    t: &RuleThresholds,
) -> i32 {
    let poor_visibility = visibility.is_some_and(|v| v < t.poor_visibility_m);
    if (codes::is_fog(code) || poor_visibility) && precip < t.precip_trace {
        codes::FOG
    } else {
        code
    }
}

/// CAPE-driven storm escalation.
fn storm_adjustment(code: i32, cape: Option<f64>, cloud: f64, precip: f64, t: &RuleThresholds) -> i32 {
    let Some(cape) = cape else {
        return code;
    };
    if cape <= t.cape_min || cloud <= t.storm_cloud_min {
        return code;
    }

    if precip >= t.precip_trace || codes::is_rain_family(code) {
        codes::THUNDERSTORM
    } else if cape > t.cape_high && codes::is_clear_family(code) && code < codes::PARTLY_CLOUDY {
        // High instability with building convective cloud, not yet
        // storming.
        codes::PARTLY_CLOUDY
    } else {
        code
    }
}

/// Convert rain to snow when the air column supports it. Codes already
/// in the snow family pass through unchanged.
fn winter_conversion(
    code: i32,
    temperature: f64,
    precip: f64,
    inputs: &RuleInputs,
    t: &RuleThresholds,
) -> i32 {
    if codes::is_snow_family(code) || !codes::is_precipitating(code) {
        return code;
    }

    let near_freezing_level = inputs
        .freezing_level
        .is_some_and(|level| level - inputs.elevation < t.freezing_distance_max);
    let cold_enough =
        temperature <= t.snow_temp_max || (temperature <= t.mixed_temp_max && near_freezing_level);
    if !cold_enough {
        return code;
    }

    if precip < t.rain_moderate_min {
        codes::SNOW_LIGHT
    } else if precip < t.rain_heavy_min {
        codes::SNOW_MODERATE
    } else {
        codes::SNOW_HEAVY
    }
}

/// Nocturnal thermal-inversion correction, independent of the code
/// chain.
///
/// Calm, clear, cold-season nights cool the surface layer below the
/// model temperature. The correction scales linearly from the maximum
/// at zero wind down to nothing at the wind cap, and is hard-clamped.
fn corrected_temperature(
    snapshot: &InstantSnapshot,
    month: u32,
    cloud: f64,
    t: &RuleThresholds,
) -> f64 {
    let applies = !snapshot.is_day
        && t.is_cold_month(month)
        && snapshot.wind_speed <= t.inversion_wind_max
        && cloud < t.inversion_cloud_max;
    if !applies {
        return snapshot.temperature;
    }

    let factor = 1.0 - snapshot.wind_speed / t.inversion_wind_max;
    let drop = (t.inversion_max_drop * factor).min(t.inversion_clamp);
    snapshot.temperature - drop
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dew_point_of_saturated_air_is_the_temperature() {
        let dp = dew_point(15.0, 100.0);
        assert!((dp - 15.0).abs() < 0.05, "dp = {dp}");
    }

    #[test]
    fn dew_point_drops_with_humidity() {
        assert!(dew_point(20.0, 40.0) < dew_point(20.0, 80.0));
    }

    #[test]
    fn effective_cloud_cover_caps_at_100() {
        let t = RuleThresholds::default();
        let snapshot = InstantSnapshot {
            cloud_cover_low: 100.0,
            cloud_cover_mid: 100.0,
            cloud_cover_high: 100.0,
            ..clear_snapshot()
        };
        assert_eq!(effective_cloud_cover(&snapshot, &t), 100.0);
    }

    #[test]
    fn low_cloud_outweighs_high_cloud() {
        let t = RuleThresholds::default();
        let low_only = InstantSnapshot {
            cloud_cover_low: 60.0,
            ..clear_snapshot()
        };
        let high_only = InstantSnapshot {
            cloud_cover_high: 60.0,
            ..clear_snapshot()
        };
        assert!(
            effective_cloud_cover(&low_only, &t) > effective_cloud_cover(&high_only, &t)
        );
    }

    fn clear_snapshot() -> InstantSnapshot {
        InstantSnapshot {
            weather_code: 0,
            temperature: 15.0,
            relative_humidity: 50.0,
            cloud_cover_low: 0.0,
            cloud_cover_mid: 0.0,
            cloud_cover_high: 0.0,
            wind_speed: 10.0,
            visibility: Some(20_000.0),
            is_day: true,
            hourly_precipitation: 0.0,
            provenance: Provenance::Consensus,
        }
    }
}

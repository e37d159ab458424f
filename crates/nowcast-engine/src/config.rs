//! Engine configuration.
//!
//! Every numeric cutoff in the rule chain, the injector and the
//! reliability scorer lives here. The defaults carry the tuned product
//! constants, but they encode product-level tuning rather than
//! meteorological law, so they stay overridable via deserialization or
//! environment.

use serde::{Deserialize, Serialize};

/// Tuning constants for the nowcast rule chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Weight of the low cloud layer in effective cloud cover.
    pub cloud_weight_low: f64,
    /// Weight of the mid cloud layer.
    pub cloud_weight_mid: f64,
    /// Weight of the high cloud layer.
    pub cloud_weight_high: f64,

    /// Effective cover below this is fully clear (%).
    pub sky_clear_max: f64,
    /// Below this, mostly clear (%).
    pub sky_mostly_clear_max: f64,
    /// Below this, partly cloudy; at or above, overcast (%).
    pub sky_partly_max: f64,

    /// Minimum precipitation treated as an active shower (mm).
    pub precip_trace: f64,
    /// Below this amount, light rain; above, moderate (mm).
    pub rain_moderate_min: f64,
    /// At or above this amount, heavy rain (mm).
    pub rain_heavy_min: f64,

    /// Relative humidity below which aloft precipitation is assumed to
    /// evaporate before reaching the surface (%).
    pub virga_humidity_max: f64,
    /// Instantaneous amount below which the virga filter may fire (mm).
    pub virga_amount_max: f64,

    /// Dew-point spread below which fog becomes plausible (degC).
    pub fog_spread_max: f64,
    /// Relative humidity above which fog becomes plausible (%).
    pub fog_humidity_min: f64,
    /// Humidity above which a fully clear sky is demoted to mostly
    /// clear (%).
    pub clear_demote_humidity: f64,
    /// Measured visibility below this forces the fog code (m).
    pub poor_visibility_m: f64,

    /// CAPE above which convection is considered possible (J/kg).
    pub cape_min: f64,
    /// CAPE above which building convective cloud is assumed even
    /// without precipitation (J/kg).
    pub cape_high: f64,
    /// Effective cloud cover required for storm escalation (%).
    pub storm_cloud_min: f64,

    /// Temperature at or below which precipitation falls as snow (degC).
    pub snow_temp_max: f64,
    /// Temperature at or below which mixed precipitation is possible
    /// when the freezing level sits close to the terrain (degC).
    pub mixed_temp_max: f64,
    /// Freezing level height above terrain below which mixed
    /// precipitation converts to snow (m).
    pub freezing_distance_max: f64,

    /// Wind speed at or below which nocturnal inversion applies (km/h).
    pub inversion_wind_max: f64,
    /// Maximum inversion correction at zero wind (degC).
    pub inversion_max_drop: f64,
    /// Hard clamp on any inversion correction (degC).
    pub inversion_clamp: f64,
    /// Effective cloud cover must stay below this for radiative
    /// cooling (%).
    pub inversion_cloud_max: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            cloud_weight_low: 1.0,
            cloud_weight_mid: 0.6,
            cloud_weight_high: 0.3,
            sky_clear_max: 15.0,
            sky_mostly_clear_max: 45.0,
            sky_partly_max: 85.0,
            precip_trace: 0.1,
            rain_moderate_min: 1.0,
            rain_heavy_min: 4.0,
            virga_humidity_max: 45.0,
            virga_amount_max: 1.5,
            fog_spread_max: 2.5,
            fog_humidity_min: 90.0,
            clear_demote_humidity: 65.0,
            poor_visibility_m: 1000.0,
            cape_min: 800.0,
            cape_high: 1500.0,
            storm_cloud_min: 60.0,
            snow_temp_max: 0.5,
            mixed_temp_max: 2.0,
            freezing_distance_max: 300.0,
            inversion_wind_max: 6.0,
            inversion_max_drop: 3.5,
            inversion_clamp: 4.0,
            inversion_cloud_max: 20.0,
        }
    }
}

impl RuleThresholds {
    /// Months in which the nocturnal inversion correction applies.
    pub fn is_cold_month(&self, month: u32) -> bool {
        matches!(month, 11 | 12 | 1 | 2 | 3)
    }
}

/// Tuning constants for the high-resolution injector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Minimum high-resolution precipitation treated as a real shower (mm).
    pub precip_trace: f64,
    /// Floor the baseline precipitation probability is raised to when
    /// the high-resolution model sees precipitation (%).
    pub probability_floor: f64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            precip_trace: 0.1,
            probability_floor: 70.0,
        }
    }
}

/// Divergence cutoffs for the reliability scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityThresholds {
    /// Max-temperature spread above which confidence is low (degC).
    pub temp_high: f64,
    /// Daily precipitation spread above which confidence is low (mm).
    pub precip_high: f64,
    /// Max-temperature spread above which confidence is medium (degC).
    pub temp_medium: f64,
    /// Daily precipitation spread above which confidence is medium (mm).
    pub precip_medium: f64,
}

impl Default for ReliabilityThresholds {
    fn default() -> Self {
        Self {
            temp_high: 5.0,
            precip_high: 10.0,
            temp_medium: 2.0,
            precip_medium: 3.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rules: RuleThresholds,
    #[serde(default)]
    pub injection: InjectionConfig,
    #[serde(default)]
    pub reliability: ReliabilityThresholds,
    /// Deadline for the bounded computation host, in milliseconds.
    #[serde(default = "default_host_deadline_ms")]
    pub host_deadline_ms: u64,
}

fn default_host_deadline_ms() -> u64 {
    4000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: RuleThresholds::default(),
            injection: InjectionConfig::default(),
            reliability: ReliabilityThresholds::default(),
            host_deadline_ms: default_host_deadline_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NOWCAST_HOST_DEADLINE_MS") {
            if let Ok(ms) = val.parse() {
                config.host_deadline_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("NOWCAST_PROBABILITY_FLOOR") {
            if let Ok(floor) = val.parse() {
                config.injection.probability_floor = floor;
            }
        }

        config
    }
}

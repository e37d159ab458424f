//! WMO weather interpretation codes and code families.
//!
//! The upstream models report present weather as WMO 4677-style integer
//! codes. The rule engine reasons about *families* of codes (clear, rain,
//! snow, storm) rather than individual values, so the predicates here are
//! the single source of truth for family membership.

/// Clear sky.
pub const CLEAR: i32 = 0;
/// Mostly clear.
pub const MOSTLY_CLEAR: i32 = 1;
/// Partly cloudy.
pub const PARTLY_CLOUDY: i32 = 2;
/// Overcast.
pub const OVERCAST: i32 = 3;

/// Fog.
pub const FOG: i32 = 45;
/// Depositing rime fog.
pub const RIME_FOG: i32 = 48;

/// Light rain.
pub const RAIN_LIGHT: i32 = 61;
/// Moderate rain.
pub const RAIN_MODERATE: i32 = 63;
/// Heavy rain.
pub const RAIN_HEAVY: i32 = 65;

/// Light snowfall.
pub const SNOW_LIGHT: i32 = 71;
/// Moderate snowfall.
pub const SNOW_MODERATE: i32 = 73;
/// Heavy snowfall.
pub const SNOW_HEAVY: i32 = 75;

/// Thunderstorm.
pub const THUNDERSTORM: i32 = 95;

/// Fallback code when the upstream current weather code is missing or
/// non-numeric: a safe "cloudy" rather than a fabricated extreme.
pub const DEFAULT_CODE: i32 = OVERCAST;

/// The serene-to-overcast range re-derivable from cloud cover alone.
pub fn is_clear_family(code: i32) -> bool {
    (CLEAR..=OVERCAST).contains(&code)
}

/// Drizzle, rain, freezing rain and rain showers.
pub fn is_rain_family(code: i32) -> bool {
    matches!(code, 51..=57 | 61..=67 | 80..=82)
}

/// Snowfall, snow grains and snow showers.
pub fn is_snow_family(code: i32) -> bool {
    matches!(code, 71..=77 | 85 | 86)
}

/// Fog codes.
pub fn is_fog(code: i32) -> bool {
    matches!(code, FOG | RIME_FOG)
}

/// Thunderstorm codes, with or without hail.
pub fn is_severe_storm(code: i32) -> bool {
    matches!(code, 95 | 96 | 99)
}

/// Any code that implies precipitation reaching the ground.
pub fn is_precipitating(code: i32) -> bool {
    is_rain_family(code) || is_snow_family(code) || is_severe_storm(code)
}

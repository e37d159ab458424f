//! Forecast model identification.
//!
//! Upstream field names may carry a model-identifying suffix
//! (`temperature_2m_ecmwf_ifs025`). The set of recognized models is a
//! closed enumeration; anything else is deliberately treated as
//! baseline data so that an unknown suffix degrades into extra
//! consensus fields instead of silently dropped data.

use serde::{Deserialize, Serialize};

/// A recognized forecast model token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelToken {
    /// The "best available" consensus blend. De-suffixed into the baseline.
    BestMatch,
    /// ECMWF IFS at 0.25 degrees.
    EcmwfIfs025,
    /// NOAA GFS global run.
    GfsGlobal,
    /// ICON-2I regional high-resolution run (Italian area).
    Icon2I,
}

impl ModelToken {
    /// All recognized tokens, longest suffix first so that greedy
    /// matching never clips a longer token to a shorter one.
    pub const ALL: [ModelToken; 4] = [
        ModelToken::Icon2I,
        ModelToken::EcmwfIfs025,
        ModelToken::GfsGlobal,
        ModelToken::BestMatch,
    ];

    /// The comparison models the reliability scorer weighs against the
    /// baseline.
    pub const COMPARISON: [ModelToken; 2] = [ModelToken::EcmwfIfs025, ModelToken::GfsGlobal];

    /// The field-name suffix used by the upstream API for this model.
    pub fn suffix(&self) -> &'static str {
        match self {
            ModelToken::BestMatch => "best_match",
            ModelToken::EcmwfIfs025 => "ecmwf_ifs025",
            ModelToken::GfsGlobal => "gfs_global",
            ModelToken::Icon2I => "italia_meteo_arpae_icon_2i",
        }
    }

    /// True for the consensus token, whose fields belong in the baseline.
    pub fn is_consensus(&self) -> bool {
        matches!(self, ModelToken::BestMatch)
    }
}

impl std::fmt::Display for ModelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Split a raw field name into its base name and a recognized model
/// suffix, if present.
///
/// `temperature_2m_gfs_global` → `("temperature_2m", Some(GfsGlobal))`.
/// Unrecognized suffixes fail open: the whole name is returned with no
/// token, so the field lands in the baseline untouched.
pub fn split_field_name(name: &str) -> (&str, Option<ModelToken>) {
    for token in ModelToken::ALL {
        let suffix = token.suffix();
        if let Some(base) = name.strip_suffix(suffix) {
            if let Some(base) = base.strip_suffix('_') {
                if !base.is_empty() {
                    return (base, Some(token));
                }
            }
        }
    }
    (name, None)
}

// ---------------------------------------------------------------------------
// High-resolution coverage
// ---------------------------------------------------------------------------

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Check if a point is contained within this bounding box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Coverage bounds of the ICON-2I regional model. Requests outside this
/// box skip the high-resolution fetch entirely.
pub const HIGH_RES_COVERAGE: BoundingBox = BoundingBox::new(35.0, 6.0, 47.5, 19.0);

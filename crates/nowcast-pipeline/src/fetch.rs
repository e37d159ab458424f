//! Collaborator interfaces for data acquisition.
//!
//! The pipeline is agnostic to how payloads are obtained; HTTP
//! transport, retry policy and provider wire formats live behind these
//! traits. Implementations return the raw JSON tree; everything
//! downstream of the fetch goes through the sanitizer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nowcast_common::ModelToken;

/// Measurement unit system requested from upstream and used in cache
/// keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

/// A geographic query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A resolved place, from the caller or the reverse geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: Option<String>,
}

/// Source of raw multi-model forecast payloads.
#[async_trait]
pub trait ForecastFetcher: Send + Sync {
    /// Fetch the combined payload for the consensus model plus the
    /// named comparison models.
    async fn fetch_forecast(
        &self,
        point: GeoPoint,
        units: UnitSystem,
        models: &[ModelToken],
    ) -> anyhow::Result<Value>;

    /// Fetch the regional high-resolution payload. Implementations may
    /// return `None` when the model has no run available for the point.
    async fn fetch_high_res(&self, point: GeoPoint, units: UnitSystem)
        -> anyhow::Result<Option<Value>>;
}

/// Source of air-quality payloads, threaded through to the advisory
/// layers untransformed.
#[async_trait]
pub trait AirQualityFetcher: Send + Sync {
    async fn fetch_air_quality(&self, point: GeoPoint) -> anyhow::Result<Option<Value>>;
}

/// Resolves coordinates to a place name when the caller supplied none.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn resolve(&self, point: GeoPoint) -> anyhow::Result<Option<Place>>;
}

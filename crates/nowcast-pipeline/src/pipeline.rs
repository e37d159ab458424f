//! End-to-end nowcast orchestration.
//!
//! Runs fetch → sanitize → normalize → bounded injection and hands the
//! resulting bundle out for per-instant and per-day queries. The
//! degradation contract: air-quality, geocoding, high-resolution and
//! deadline problems degrade the bundle; only an unreachable or
//! unusable forecast source and injection faults surface as errors.

use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use nowcast_common::codes;
use nowcast_common::observations::{
    EffectiveConditionResult, NormalizedForecast, ReliabilityAssessment,
};
use nowcast_common::time::{hour_key, hour_key_of, index_for_instant};
use nowcast_common::ModelToken;
use nowcast_engine::{
    compute_effective_condition, run_bounded_injection, BoundedOutcome, EngineError,
    InstantSnapshot, RuleInputs,
};

use crate::cache::{air_quality_cache_key, forecast_cache_key, KeyValueCache};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::{AirQualityFetcher, ForecastFetcher, GeoPoint, Place, ReverseGeocoder};

/// The fused output of one pipeline run, owned by the caller.
#[derive(Debug, Clone)]
pub struct NowcastBundle {
    pub place: Option<Place>,
    pub forecast: NormalizedForecast,
    /// Air-quality payload, threaded through untransformed.
    pub air_quality: Option<Value>,
    /// True when the host deadline expired and the forecast is the
    /// unenhanced baseline.
    pub degraded: bool,
}

impl NowcastBundle {
    /// Compute the effective condition for an instant on the hourly
    /// axis. Returns `None` when the instant is outside the forecast
    /// horizon.
    pub fn condition_at(
        &self,
        instant: DateTime<Utc>,
        config: &PipelineConfig,
    ) -> Option<EffectiveConditionResult> {
        let snapshot = instant_snapshot(&self.forecast, instant)?;
        let inputs = rule_inputs(&self.forecast, instant)?;
        Some(compute_effective_condition(
            &snapshot,
            &inputs,
            &config.engine.rules,
        ))
    }

    /// Assess inter-model reliability for a day on the daily axis.
    ///
    /// A day index beyond the horizon, or models that reported nothing,
    /// fail open into high confidence.
    pub fn reliability_for_day(
        &self,
        day_index: usize,
        config: &PipelineConfig,
    ) -> ReliabilityAssessment {
        let daily = &self.forecast.baseline.daily;
        let comparison = |model: ModelToken, field: &str| -> Option<f64> {
            self.forecast
                .daily_comparison
                .get(&model)?
                .get(day_index)?
                .get(field)
                .copied()
        };

        let max_temps = [
            daily.value("temperature_2m_max", day_index),
            comparison(ModelToken::EcmwfIfs025, "temperature_2m_max"),
            comparison(ModelToken::GfsGlobal, "temperature_2m_max"),
        ];
        let precip_sums = [
            daily.value("precipitation_sum", day_index),
            comparison(ModelToken::EcmwfIfs025, "precipitation_sum"),
            comparison(ModelToken::GfsGlobal, "precipitation_sum"),
        ];

        nowcast_engine::assess_reliability(&max_temps, &precip_sums, &config.engine.reliability)
    }
}

/// Build the rule-engine snapshot for an instant, preferring the hourly
/// series and falling back to the current scalar block.
pub fn instant_snapshot(
    forecast: &NormalizedForecast,
    instant: DateTime<Utc>,
) -> Option<InstantSnapshot> {
    let baseline = &forecast.baseline;
    let index = index_for_instant(&baseline.hourly.time, instant)?;
    let pick = |field: &str| {
        baseline
            .hourly
            .value(field, index)
            .or_else(|| baseline.current.get(field))
    };

    Some(InstantSnapshot {
        weather_code: pick("weather_code").map_or(codes::DEFAULT_CODE, |c| c as i32),
        temperature: pick("temperature_2m").unwrap_or(0.0),
        relative_humidity: pick("relative_humidity_2m").unwrap_or(50.0),
        cloud_cover_low: pick("cloud_cover_low")
            .or_else(|| pick("cloud_cover"))
            .unwrap_or(0.0),
        cloud_cover_mid: pick("cloud_cover_mid").unwrap_or(0.0),
        cloud_cover_high: pick("cloud_cover_high").unwrap_or(0.0),
        wind_speed: pick("wind_speed_10m").unwrap_or(0.0),
        visibility: pick("visibility"),
        is_day: pick("is_day").map_or(true, |v| v != 0.0),
        hourly_precipitation: pick("precipitation").unwrap_or(0.0),
        provenance: baseline.current.provenance,
    })
}

/// Gather the ancillary rule-engine signals for an instant.
pub fn rule_inputs(forecast: &NormalizedForecast, instant: DateTime<Utc>) -> Option<RuleInputs> {
    let baseline = &forecast.baseline;
    let index = index_for_instant(&baseline.hourly.time, instant)?;
    let wanted = hour_key_of(instant);

    // Minute-resolution samples belonging to the instant's hour.
    let minutely_precipitation = baseline
        .minutely
        .time
        .iter()
        .enumerate()
        .filter(|(_, t)| hour_key(t).as_deref() == Some(wanted.as_str()))
        .filter_map(|(i, _)| baseline.minutely.value("precipitation", i))
        .collect();

    Some(RuleInputs {
        minutely_precipitation,
        rain_probability: baseline.hourly.value("precipitation_probability", index),
        freezing_level: baseline.hourly.value("freezing_level_height", index),
        elevation: baseline.elevation.unwrap_or(0.0),
        cape: baseline.hourly.value("cape", index),
        month: instant.month(),
    })
}

/// The orchestrating pipeline over injected collaborators.
pub struct NowcastPipeline<F, A, G, C> {
    fetcher: F,
    air_quality: A,
    geocoder: G,
    cache: C,
    config: PipelineConfig,
}

impl<F, A, G, C> NowcastPipeline<F, A, G, C>
where
    F: ForecastFetcher,
    A: AirQualityFetcher,
    G: ReverseGeocoder,
    C: KeyValueCache,
{
    pub fn new(fetcher: F, air_quality: A, geocoder: G, cache: C, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            air_quality,
            geocoder,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for one query point.
    pub async fn nowcast(&self, point: GeoPoint, place_name: Option<String>) -> Result<NowcastBundle> {
        let (raw, air_quality, high_res, place) = tokio::join!(
            self.fetch_forecast_cached(point),
            self.fetch_air_quality_cached(point),
            self.fetch_high_res(point),
            self.resolve_place(point, place_name),
        );
        let raw = raw?;

        let sanitized = nowcast_engine::sanitize(&raw).map_err(EngineError::from)?;
        let baseline = nowcast_engine::normalize(sanitized);

        let (forecast, degraded) =
            match run_bounded_injection(baseline, high_res, &self.config.engine).await {
                BoundedOutcome::Completed(forecast) => (forecast, false),
                BoundedOutcome::TimedOutFallback(forecast) => {
                    warn!("injection deadline expired, serving unenhanced baseline");
                    (forecast, true)
                }
                BoundedOutcome::Faulted(err) => return Err(err.into()),
            };

        info!(
            lat = point.latitude,
            lon = point.longitude,
            degraded,
            provenance = ?forecast.baseline.current.provenance,
            "nowcast ready"
        );

        Ok(NowcastBundle {
            place,
            forecast,
            air_quality,
            degraded,
        })
    }

    async fn fetch_forecast_cached(&self, point: GeoPoint) -> Result<Value> {
        let key = forecast_cache_key(point, self.config.units);
        if let Some(cached) = self.cache.get(&key, self.config.cache_ttl()).await {
            debug!(%key, "forecast served from cache");
            return Ok(cached);
        }

        let models = [
            ModelToken::BestMatch,
            ModelToken::EcmwfIfs025,
            ModelToken::GfsGlobal,
        ];
        let raw = self
            .fetcher
            .fetch_forecast(point, self.config.units, &models)
            .await
            .map_err(PipelineError::Fetch)?;
        self.cache.set(&key, raw.clone()).await;
        Ok(raw)
    }

    async fn fetch_air_quality_cached(&self, point: GeoPoint) -> Option<Value> {
        let key = air_quality_cache_key(point);
        if let Some(cached) = self.cache.get(&key, self.config.cache_ttl()).await {
            return Some(cached);
        }

        match self.air_quality.fetch_air_quality(point).await {
            Ok(Some(raw)) => {
                self.cache.set(&key, raw.clone()).await;
                Some(raw)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "air-quality fetch failed, continuing without");
                None
            }
        }
    }

    async fn fetch_high_res(&self, point: GeoPoint) -> Option<Value> {
        if !self
            .config
            .high_res_coverage
            .contains(point.latitude, point.longitude)
        {
            debug!("point outside high-resolution coverage, skipping fetch");
            return None;
        }

        match self.fetcher.fetch_high_res(point, self.config.units).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "high-resolution fetch failed, continuing with baseline");
                None
            }
        }
    }

    async fn resolve_place(&self, point: GeoPoint, place_name: Option<String>) -> Option<Place> {
        if let Some(name) = place_name {
            return Some(Place {
                name,
                country: None,
            });
        }

        match self.geocoder.resolve(point).await {
            Ok(place) => place,
            Err(err) => {
                warn!(error = %err, "reverse geocoding failed, continuing unnamed");
                None
            }
        }
    }
}

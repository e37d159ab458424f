//! End-to-end tests for the orchestrating pipeline, exercising caching,
//! coverage gating and the degradation contract with mock collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use nowcast_common::{DivergenceType, Provenance, ReliabilityLevel};
use nowcast_pipeline::{
    AirQualityFetcher, ForecastFetcher, GeoPoint, MemoryCache, NowcastPipeline, Place,
    PipelineConfig, PipelineError, ReverseGeocoder,
};

const MILAN: GeoPoint = GeoPoint {
    latitude: 45.4642,
    longitude: 9.19,
};

const REYKJAVIK: GeoPoint = GeoPoint {
    latitude: 64.1466,
    longitude: -21.9426,
};

fn forecast_payload() -> Value {
    json!({
        "latitude": 45.4642,
        "longitude": 9.19,
        "elevation": 122.0,
        "current": {
            "time": "2024-01-15T21:00",
            "temperature_2m": 4.0,
            "relative_humidity_2m": 60.0,
            "weather_code": 1,
            "cloud_cover": 10.0,
            "wind_speed_10m": 2.0,
            "is_day": 0
        },
        "hourly": {
            "time": ["2024-01-15T21:00", "2024-01-15T22:00"],
            "temperature_2m": [4.0, 3.5],
            "relative_humidity_2m": [60.0, 62.0],
            "weather_code": [1, 1],
            "cloud_cover_low": [10.0, 10.0],
            "cloud_cover_mid": [0.0, 0.0],
            "cloud_cover_high": [0.0, 0.0],
            "wind_speed_10m": [2.0, 2.0],
            "precipitation": [0.0, 0.0],
            "is_day": [0, 0]
        },
        "daily": {
            "time": ["2024-01-15"],
            "temperature_2m_max": [20.0],
            "temperature_2m_max_ecmwf_ifs025": [26.0],
            "temperature_2m_max_gfs_global": [21.0],
            "precipitation_sum": [0.0],
            "precipitation_sum_ecmwf_ifs025": [0.5],
            "precipitation_sum_gfs_global": [1.0]
        }
    })
}

fn high_res_payload() -> Value {
    json!({
        "latitude": 45.46,
        "longitude": 9.19,
        "current": {
            "temperature_2m": 5.2,
            "weather_code": 2
        },
        "hourly": {
            "time": ["2024-01-15T21:00"],
            "precipitation": [0.0]
        }
    })
}

// ============================================================================
// Mock collaborators
// ============================================================================

struct MockFetcher {
    forecast: Value,
    high_res: Option<Value>,
    fail_forecast: bool,
    forecast_calls: Arc<AtomicUsize>,
    high_res_calls: Arc<AtomicUsize>,
}

impl MockFetcher {
    fn new(forecast: Value) -> Self {
        Self {
            forecast,
            high_res: None,
            fail_forecast: false,
            forecast_calls: Arc::new(AtomicUsize::new(0)),
            high_res_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_high_res(mut self, payload: Value) -> Self {
        self.high_res = Some(payload);
        self
    }
}

#[async_trait]
impl ForecastFetcher for MockFetcher {
    async fn fetch_forecast(
        &self,
        _point: GeoPoint,
        _units: nowcast_pipeline::UnitSystem,
        _models: &[nowcast_common::ModelToken],
    ) -> anyhow::Result<Value> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_forecast {
            anyhow::bail!("upstream unavailable");
        }
        Ok(self.forecast.clone())
    }

    async fn fetch_high_res(
        &self,
        _point: GeoPoint,
        _units: nowcast_pipeline::UnitSystem,
    ) -> anyhow::Result<Option<Value>> {
        self.high_res_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.high_res.clone())
    }
}

struct MockAirQuality {
    payload: Option<Value>,
    fail: bool,
}

#[async_trait]
impl AirQualityFetcher for MockAirQuality {
    async fn fetch_air_quality(&self, _point: GeoPoint) -> anyhow::Result<Option<Value>> {
        if self.fail {
            anyhow::bail!("air-quality source down");
        }
        Ok(self.payload.clone())
    }
}

struct MockGeocoder {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl MockGeocoder {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    async fn resolve(&self, _point: GeoPoint) -> anyhow::Result<Option<Place>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("geocoder down");
        }
        Ok(Some(Place {
            name: "Milano".to_string(),
            country: Some("IT".to_string()),
        }))
    }
}

fn pipeline(
    fetcher: MockFetcher,
    air: MockAirQuality,
    geo: MockGeocoder,
    config: PipelineConfig,
) -> NowcastPipeline<MockFetcher, MockAirQuality, MockGeocoder, MemoryCache> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    NowcastPipeline::new(fetcher, air, geo, MemoryCache::new(), config)
}

fn quiet_air() -> MockAirQuality {
    MockAirQuality {
        payload: Some(json!({ "current": { "european_aqi": 23 } })),
        fail: false,
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_full_run_produces_enhanced_bundle() {
    let fetcher = MockFetcher::new(forecast_payload()).with_high_res(high_res_payload());
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), PipelineConfig::default());

    let bundle = p.nowcast(MILAN, None).await.unwrap();

    assert!(!bundle.degraded);
    assert_eq!(bundle.place.as_ref().unwrap().name, "Milano");
    assert!(bundle.air_quality.is_some());
    // The regional current block overrode the consensus scalars.
    assert_eq!(
        bundle.forecast.baseline.current.provenance,
        Provenance::HighResolution
    );
    assert_eq!(bundle.forecast.baseline.current.get("temperature_2m"), Some(5.2));
}

#[tokio::test]
async fn test_supplied_place_name_skips_the_geocoder() {
    let geo = MockGeocoder::new();
    let geo_calls = geo.calls.clone();
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        quiet_air(),
        geo,
        PipelineConfig::default(),
    );

    let bundle = p.nowcast(MILAN, Some("Porta Romana".to_string())).await.unwrap();

    assert_eq!(geo_calls.load(Ordering::SeqCst), 0);
    assert_eq!(bundle.place.unwrap().name, "Porta Romana");
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_repeat_queries_are_served_from_cache() {
    let fetcher = MockFetcher::new(forecast_payload());
    let forecast_calls = fetcher.forecast_calls.clone();
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), PipelineConfig::default());

    p.nowcast(MILAN, None).await.unwrap();
    p.nowcast(MILAN, None).await.unwrap();

    assert_eq!(forecast_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_distinct_points_do_not_share_entries() {
    let fetcher = MockFetcher::new(forecast_payload());
    let forecast_calls = fetcher.forecast_calls.clone();
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), PipelineConfig::default());

    p.nowcast(MILAN, None).await.unwrap();
    p.nowcast(REYKJAVIK, None).await.unwrap();

    assert_eq!(forecast_calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Degradation contract
// ============================================================================

#[tokio::test]
async fn test_unusable_payload_surfaces_as_engine_error() {
    let p = pipeline(
        MockFetcher::new(json!([1, 2, 3])),
        quiet_air(),
        MockGeocoder::new(),
        PipelineConfig::default(),
    );

    let err = p.nowcast(MILAN, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Engine(_)));
}

#[tokio::test]
async fn test_forecast_fetch_failure_surfaces() {
    let mut fetcher = MockFetcher::new(forecast_payload());
    fetcher.fail_forecast = true;
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), PipelineConfig::default());

    let err = p.nowcast(MILAN, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Fetch(_)));
}

#[tokio::test]
async fn test_air_quality_failure_degrades_to_none() {
    let air = MockAirQuality {
        payload: None,
        fail: true,
    };
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        air,
        MockGeocoder::new(),
        PipelineConfig::default(),
    );

    let bundle = p.nowcast(MILAN, None).await.unwrap();
    assert!(bundle.air_quality.is_none());
    assert!(!bundle.degraded);
}

#[tokio::test]
async fn test_geocoder_failure_leaves_the_bundle_unnamed() {
    let mut geo = MockGeocoder::new();
    geo.fail = true;
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        quiet_air(),
        geo,
        PipelineConfig::default(),
    );

    let bundle = p.nowcast(MILAN, None).await.unwrap();
    assert!(bundle.place.is_none());
}

#[tokio::test]
async fn test_expired_deadline_serves_unenhanced_baseline() {
    let fetcher = MockFetcher::new(forecast_payload()).with_high_res(high_res_payload());
    let mut config = PipelineConfig::default();
    config.engine.host_deadline_ms = 0;
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), config);

    let bundle = p.nowcast(MILAN, None).await.unwrap();

    assert!(bundle.degraded);
    // The high-resolution current scalars never landed.
    assert_eq!(
        bundle.forecast.baseline.current.provenance,
        Provenance::Consensus
    );
    assert_eq!(bundle.forecast.baseline.current.get("temperature_2m"), Some(4.0));
}

// ============================================================================
// Coverage gating
// ============================================================================

#[tokio::test]
async fn test_high_res_fetch_skipped_outside_coverage() {
    let fetcher = MockFetcher::new(forecast_payload()).with_high_res(high_res_payload());
    let high_res_calls = fetcher.high_res_calls.clone();
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), PipelineConfig::default());

    let bundle = p.nowcast(REYKJAVIK, None).await.unwrap();

    assert_eq!(high_res_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        bundle.forecast.baseline.current.provenance,
        Provenance::Consensus
    );
}

#[tokio::test]
async fn test_high_res_fetch_runs_inside_coverage() {
    let fetcher = MockFetcher::new(forecast_payload()).with_high_res(high_res_payload());
    let high_res_calls = fetcher.high_res_calls.clone();
    let p = pipeline(fetcher, quiet_air(), MockGeocoder::new(), PipelineConfig::default());

    p.nowcast(MILAN, None).await.unwrap();
    assert_eq!(high_res_calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Bundle queries
// ============================================================================

#[tokio::test]
async fn test_condition_at_applies_the_rule_chain() {
    let config = PipelineConfig::default();
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        quiet_air(),
        MockGeocoder::new(),
        config.clone(),
    );
    let bundle = p.nowcast(MILAN, None).await.unwrap();

    let instant = Utc.with_ymd_and_hms(2024, 1, 15, 21, 30, 0).unwrap();
    let result = bundle.condition_at(instant, &config).unwrap();

    // Ten percent low cloud on a calm winter night: clear sky, with the
    // nocturnal inversion pulling the temperature down.
    assert_eq!(result.effective_code, 0);
    let expected_drop = 3.5 * (1.0 - 2.0 / 6.0);
    assert!((result.corrected_temperature - (4.0 - expected_drop)).abs() < 1e-9);
}

#[tokio::test]
async fn test_condition_outside_the_horizon_is_none() {
    let config = PipelineConfig::default();
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        quiet_air(),
        MockGeocoder::new(),
        config.clone(),
    );
    let bundle = p.nowcast(MILAN, None).await.unwrap();

    let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    assert!(bundle.condition_at(instant, &config).is_none());
}

#[tokio::test]
async fn test_reliability_flags_the_divergent_day() {
    let config = PipelineConfig::default();
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        quiet_air(),
        MockGeocoder::new(),
        config.clone(),
    );
    let bundle = p.nowcast(MILAN, None).await.unwrap();

    let assessment = bundle.reliability_for_day(0, &config);
    assert_eq!(assessment.level, ReliabilityLevel::Low);
    assert_eq!(assessment.divergence, DivergenceType::Temperature);
    assert_eq!(assessment.magnitude, 6.0);
}

#[tokio::test]
async fn test_reliability_beyond_the_horizon_fails_open() {
    let config = PipelineConfig::default();
    let p = pipeline(
        MockFetcher::new(forecast_payload()),
        quiet_air(),
        MockGeocoder::new(),
        config.clone(),
    );
    let bundle = p.nowcast(MILAN, None).await.unwrap();

    let assessment = bundle.reliability_for_day(9, &config);
    assert_eq!(assessment.level, ReliabilityLevel::High);
    assert_eq!(assessment.divergence, DivergenceType::Ok);
}

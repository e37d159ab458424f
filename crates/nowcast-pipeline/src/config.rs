//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use nowcast_common::{BoundingBox, HIGH_RES_COVERAGE};
use nowcast_engine::EngineConfig;

use crate::fetch::UnitSystem;

/// Configuration for the orchestrating pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unit system requested from upstream sources.
    #[serde(default)]
    pub units: UnitSystem,

    /// Read-through cache TTL, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Coverage bounds gating the high-resolution fetch.
    #[serde(default = "default_high_res_coverage")]
    pub high_res_coverage: BoundingBox,

    /// Engine thresholds and the host deadline.
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

fn default_high_res_coverage() -> BoundingBox {
    HIGH_RES_COVERAGE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            cache_ttl_secs: default_cache_ttl_secs(),
            high_res_coverage: default_high_res_coverage(),
            engine: EngineConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self {
            engine: EngineConfig::from_env(),
            ..Self::default()
        };

        if let Ok(val) = std::env::var("NOWCAST_CACHE_TTL_SECS") {
            if let Ok(secs) = val.parse() {
                config.cache_ttl_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("NOWCAST_UNITS") {
            if val.eq_ignore_ascii_case("imperial") {
                config.units = UnitSystem::Imperial;
            }
        }

        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

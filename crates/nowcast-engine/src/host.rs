//! Bounded computation host: runs the injector in an isolated task
//! under a hard deadline.
//!
//! Three-way outcome, deliberately not a boolean: a deadline expiry is a
//! *successful* fallback to the unenhanced baseline, while a fault
//! inside the task indicates a real defect and is surfaced distinctly.

use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use nowcast_common::observations::NormalizedForecast;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::inject::inject_high_res;

/// Outcome of a bounded computation.
#[derive(Debug)]
pub enum BoundedOutcome<T> {
    /// The task finished within the deadline.
    Completed(T),
    /// The deadline expired; the caller receives the fallback value.
    TimedOutFallback(T),
    /// The task crashed.
    Faulted(EngineError),
}

/// Outcome of a bounded injection run.
pub type HostOutcome = BoundedOutcome<NormalizedForecast>;

impl<T> BoundedOutcome<T> {
    /// True for the deadline-expiry path.
    pub fn is_degraded(&self) -> bool {
        matches!(self, BoundedOutcome::TimedOutFallback(_))
    }

    /// Collapse the two successful paths into a value, keeping the
    /// fault path as an error.
    pub fn into_value(self) -> crate::error::Result<T> {
        match self {
            BoundedOutcome::Completed(value) | BoundedOutcome::TimedOutFallback(value) => Ok(value),
            BoundedOutcome::Faulted(err) => Err(err),
        }
    }
}

/// Run `task` on a blocking worker with a wall-clock deadline.
///
/// On expiry the task is disowned and its eventual result discarded;
/// the single observable effect is that the caller gets `fallback`.
pub async fn run_bounded<T, F>(task: F, fallback: T, deadline: Duration) -> BoundedOutcome<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(value)) => BoundedOutcome::Completed(value),
        Ok(Err(join_err)) => {
            let detail = if join_err.is_panic() {
                format!("injection task panicked: {join_err}")
            } else {
                format!("injection task cancelled: {join_err}")
            };
            BoundedOutcome::Faulted(EngineError::ComputationFault(detail))
        }
        Err(_elapsed) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "bounded computation deadline expired, falling back to baseline");
            BoundedOutcome::TimedOutFallback(fallback)
        }
    }
}

/// Run the high-resolution injection under the configured deadline.
///
/// The baseline is cloned up front so that the original survives as the
/// fallback regardless of how far the injection got.
pub async fn run_bounded_injection(
    baseline: NormalizedForecast,
    high_res: Option<Value>,
    config: &EngineConfig,
) -> HostOutcome {
    let fallback = baseline.clone();
    let injection = config.injection.clone();
    run_bounded(
        move || inject_high_res(baseline, high_res.as_ref(), &injection),
        fallback,
        Duration::from_millis(config.host_deadline_ms),
    )
    .await
}

//! Schema sanitizer: coerces an arbitrary raw payload into the strict
//! internal shape.
//!
//! Nothing in here panics or propagates field-level problems. A value
//! that is not representable as a finite number becomes `None` (arrays)
//! or a safe default (required scalars). The only hard failures are
//! structural: the payload is not an object, the mandatory `current`
//! block is absent, or the coordinates are missing; those make the
//! whole payload unusable and the caller gets an explicit error rather
//! than a half-populated set.

use serde_json::Value;

use nowcast_common::codes;
use nowcast_common::observations::{CurrentGroup, SeriesGroup, ValidatedObservationSet};
use nowcast_common::{NowcastError, Provenance};

/// Sanitize a raw upstream payload.
///
/// Guarantees on success: every array field is numeric-or-null and no
/// longer than its group's `time` axis, coordinates are finite, and the
/// current snapshot carries a weather code (defaulted to cloudy when the
/// upstream omitted or mangled it).
pub fn sanitize(raw: &Value) -> Result<ValidatedObservationSet, NowcastError> {
    let mut set = sanitize_partial(raw)?;

    // The present-weather code is required downstream; a missing or
    // mangled one falls back to a safe cloudy state.
    if set.current.get("weather_code").is_none() {
        set.current.set("weather_code", codes::DEFAULT_CODE as f64);
    }

    Ok(set)
}

/// Sanitize without substituting defaults for required scalars.
///
/// The injector validates secondary sources with this variant: a field
/// the regional model did not report must stay absent, otherwise a
/// fabricated default would overwrite real baseline data during the
/// merge.
pub fn sanitize_partial(raw: &Value) -> Result<ValidatedObservationSet, NowcastError> {
    let obj = raw.as_object().ok_or(NowcastError::NotAnObject)?;

    let latitude =
        coerce_number(obj.get("latitude")).ok_or(NowcastError::InvalidCoordinate("latitude"))?;
    let longitude =
        coerce_number(obj.get("longitude")).ok_or(NowcastError::InvalidCoordinate("longitude"))?;
    let elevation = coerce_number(obj.get("elevation"));

    let current = match obj.get("current") {
        Some(Value::Object(block)) => sanitize_current(block),
        _ => return Err(NowcastError::MissingBlock("current")),
    };

    Ok(ValidatedObservationSet {
        latitude,
        longitude,
        elevation,
        current,
        hourly: sanitize_series(obj.get("hourly")),
        daily: sanitize_series(obj.get("daily")),
        minutely: sanitize_series(obj.get("minutely_15")),
    })
}

/// Coerce a JSON value to a finite number, accepting numeric strings.
///
/// Upstream models occasionally emit `"12.5"` where a number belongs;
/// anything else (null, booleans, NaN, objects) is rejected.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn sanitize_current(block: &serde_json::Map<String, Value>) -> CurrentGroup {
    let mut current = CurrentGroup {
        time: block.get("time").and_then(Value::as_str).map(str::to_string),
        provenance: Provenance::Consensus,
        ..Default::default()
    };

    for (name, value) in block {
        if name == "time" || name == "interval" {
            continue;
        }
        if let Some(n) = coerce_number(Some(value)) {
            current.set(name, n);
        }
    }

    current
}

/// Sanitize one `time`-keyed group of parallel arrays.
///
/// An absent or malformed group sanitizes to an empty one; a field that
/// is not an array is dropped (field-level invalid, not an error).
/// Arrays longer than the time axis are truncated so the
/// `len(field) <= len(time)` invariant always holds.
fn sanitize_series(group: Option<&Value>) -> SeriesGroup {
    let Some(Value::Object(block)) = group else {
        return SeriesGroup::default();
    };

    let time: Vec<String> = match block.get("time") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|t| t.as_str().unwrap_or_default().to_string())
            .collect(),
        _ => return SeriesGroup::default(),
    };

    let mut series = SeriesGroup {
        time,
        ..Default::default()
    };

    for (name, value) in block {
        if name == "time" {
            continue;
        }
        let Value::Array(items) = value else {
            continue;
        };
        let values: Vec<Option<f64>> = items
            .iter()
            .take(series.time.len())
            .map(|v| coerce_number(Some(v)))
            .collect();
        series.fields.insert(name.clone(), values);
    }

    series
}

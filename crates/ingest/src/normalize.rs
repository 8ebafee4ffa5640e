//! Upstream response normalization.
//!
//! The telemetry providers this service consumes do not share a response
//! schema. Three shapes are recognized, probed in fixed priority order:
//!
//! 1. open-notify style: an embedded `iss_position` object with
//!    string-typed latitude/longitude plus a top-level epoch-seconds
//!    `timestamp`. No altitude or velocity.
//! 2. wheretheiss.at style: top-level `latitude`/`longitude` plus
//!    epoch-seconds `timestamp`, with optional `altitude`/`velocity`.
//! 3. satellitemap.space style: abbreviated `lat`/`lon` keys plus an
//!    ISO-8601 `timestamp` string with a trailing `Z`, optional `alt`,
//!    never any velocity.
//!
//! Anything else is an unrecognized format; a recognized field holding an
//! invalid value is malformed data. Neither case panics.

use chrono::{DateTime, Utc};
use serde_json::Value;

use sattrack_core::model::ObservedPosition;

/// Typed failure produced when an upstream body cannot be normalized.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("unrecognized response format")]
    UnrecognizedFormat,

    #[error("malformed field '{field}': {reason}")]
    MalformedField { field: &'static str, reason: String },
}

fn malformed(field: &'static str, reason: impl Into<String>) -> NormalizeError {
    NormalizeError::MalformedField {
        field,
        reason: reason.into(),
    }
}

/// Map a decoded upstream body into the canonical position form.
pub fn normalize(body: &Value) -> Result<ObservedPosition, NormalizeError> {
    if body.get("iss_position").is_some() {
        embedded_position(body)
    } else if body.get("latitude").is_some() {
        flat_epoch(body)
    } else if body.get("lat").is_some() {
        abbreviated_iso(body)
    } else {
        Err(NormalizeError::UnrecognizedFormat)
    }
}

/// Shape 1: `{"iss_position": {"latitude": "…", "longitude": "…"}, "timestamp": n}`.
fn embedded_position(body: &Value) -> Result<ObservedPosition, NormalizeError> {
    let pos = body
        .get("iss_position")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("iss_position", "expected an object"))?;

    Ok(ObservedPosition {
        observed_at: epoch_field(body, "timestamp")?,
        latitude: numeric_field(pos.get("latitude"), "iss_position.latitude")?,
        longitude: numeric_field(pos.get("longitude"), "iss_position.longitude")?,
        altitude: None,
        velocity: None,
    })
}

/// Shape 2: top-level `latitude`/`longitude`/`timestamp`, optional extras.
fn flat_epoch(body: &Value) -> Result<ObservedPosition, NormalizeError> {
    Ok(ObservedPosition {
        observed_at: epoch_field(body, "timestamp")?,
        latitude: numeric_field(body.get("latitude"), "latitude")?,
        longitude: numeric_field(body.get("longitude"), "longitude")?,
        altitude: lenient_optional(body, "altitude"),
        velocity: lenient_optional(body, "velocity"),
    })
}

/// Shape 3: `lat`/`lon` plus an ISO-8601 timestamp, optional `alt`.
fn abbreviated_iso(body: &Value) -> Result<ObservedPosition, NormalizeError> {
    let raw = body
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("timestamp", "expected an ISO-8601 string"))?;
    let observed_at = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| malformed("timestamp", e.to_string()))?
        .with_timezone(&Utc);

    Ok(ObservedPosition {
        observed_at,
        latitude: numeric_field(body.get("lat"), "lat")?,
        longitude: numeric_field(body.get("lon"), "lon")?,
        altitude: lenient_optional(body, "alt"),
        velocity: None,
    })
}

/// Required numeric field that upstreams serialize as either a number or a
/// numeric string.
fn numeric_field(value: Option<&Value>, field: &'static str) -> Result<f64, NormalizeError> {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed(field, "number out of range")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(field, format!("not a number: {s:?}"))),
        Some(other) => Err(malformed(field, format!("unexpected type: {other}"))),
        None => Err(malformed(field, "missing")),
    }
}

/// Optional numeric field with the upstream's lenient default behavior:
/// a missing key is absent, but a key that is present with a null or
/// unparseable value reads as 0.0.
fn lenient_optional(body: &Value, field: &'static str) -> Option<f64> {
    let value = body.get(field)?;
    Some(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Epoch-seconds timestamp, accepted as an integer or a numeric string.
fn epoch_field(body: &Value, field: &'static str) -> Result<DateTime<Utc>, NormalizeError> {
    let secs = match body.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| malformed(field, "not an integer"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(field, format!("not an epoch integer: {s:?}")))?,
        Some(other) => return Err(malformed(field, format!("unexpected type: {other}"))),
        None => return Err(malformed(field, "missing")),
    };
    DateTime::from_timestamp(secs, 0).ok_or_else(|| malformed(field, "epoch out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_position_shape() {
        let body = json!({
            "iss_position": {"latitude": "10.5", "longitude": "-20.1"},
            "timestamp": 1_700_000_000
        });
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.latitude, 10.5);
        assert_eq!(obs.longitude, -20.1);
        assert_eq!(obs.altitude, None);
        assert_eq!(obs.velocity, None);
        assert_eq!(obs.observed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn embedded_position_bad_latitude_is_malformed() {
        let body = json!({
            "iss_position": {"latitude": "north", "longitude": "-20.1"},
            "timestamp": 1_700_000_000
        });
        match normalize(&body).unwrap_err() {
            NormalizeError::MalformedField { field, .. } => {
                assert_eq!(field, "iss_position.latitude");
            }
            other => panic!("expected malformed field, got: {other:?}"),
        }
    }

    #[test]
    fn flat_epoch_without_optional_keys() {
        let body = json!({"latitude": 10.5, "longitude": -20.1, "timestamp": 1_700_000_000});
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.latitude, 10.5);
        assert_eq!(obs.longitude, -20.1);
        assert_eq!(obs.altitude, None);
        assert_eq!(obs.velocity, None);
    }

    #[test]
    fn flat_epoch_null_altitude_reads_as_zero() {
        let body = json!({
            "latitude": 10.5, "longitude": -20.1, "timestamp": 1_700_000_000,
            "altitude": null
        });
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.altitude, Some(0.0));
        assert_eq!(obs.velocity, None);
    }

    #[test]
    fn flat_epoch_with_extras() {
        let body = json!({
            "latitude": "51.0", "longitude": "7.2", "timestamp": "1700000000",
            "altitude": 417.5, "velocity": 27571.3
        });
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.latitude, 51.0);
        assert_eq!(obs.altitude, Some(417.5));
        assert_eq!(obs.velocity, Some(27571.3));
    }

    #[test]
    fn abbreviated_iso_shape() {
        let body = json!({
            "lat": 10.5, "lon": -20.1,
            "timestamp": "2023-11-14T00:00:00Z", "alt": 400.0
        });
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.altitude, Some(400.0));
        assert_eq!(obs.velocity, None);
        assert_eq!(
            obs.observed_at,
            DateTime::parse_from_rfc3339("2023-11-14T00:00:00Z").unwrap()
        );
    }

    #[test]
    fn abbreviated_iso_missing_alt_is_absent() {
        let body = json!({"lat": 1.0, "lon": 2.0, "timestamp": "2023-11-14T12:30:00Z"});
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.altitude, None);
    }

    #[test]
    fn abbreviated_iso_bad_timestamp_is_malformed() {
        let body = json!({"lat": 1.0, "lon": 2.0, "timestamp": "yesterday"});
        assert!(matches!(
            normalize(&body).unwrap_err(),
            NormalizeError::MalformedField { field: "timestamp", .. }
        ));
    }

    #[test]
    fn unknown_shape_is_unrecognized() {
        let body = json!({"foo": "bar"});
        assert!(matches!(
            normalize(&body).unwrap_err(),
            NormalizeError::UnrecognizedFormat
        ));
    }

    #[test]
    fn shape_priority_prefers_embedded_position() {
        // A body carrying both shape-1 and shape-2 markers reads as shape 1.
        let body = json!({
            "iss_position": {"latitude": "1.0", "longitude": "2.0"},
            "latitude": 99.0, "longitude": 99.0,
            "timestamp": 1_700_000_000
        });
        let obs = normalize(&body).unwrap();
        assert_eq!(obs.latitude, 1.0);
    }

    #[test]
    fn epoch_out_of_range_is_malformed() {
        let body = json!({"latitude": 1.0, "longitude": 2.0, "timestamp": i64::MAX});
        assert!(matches!(
            normalize(&body).unwrap_err(),
            NormalizeError::MalformedField { field: "timestamp", .. }
        ));
    }
}

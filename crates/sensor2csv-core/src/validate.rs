//! Payload validation.
//!
//! Runs on the producer's critical path, so it parses and timestamps only.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

use crate::record::{FieldValue, Record, TIMESTAMP_FIELD};
use crate::IngestError;

/// Validate a raw payload and stamp it with the current wall clock.
pub fn validate(payload: &[u8]) -> Result<Record, IngestError> {
    validate_at(payload, Utc::now())
}

/// Validate a raw payload, stamping it with `received_at`.
pub fn validate_at(payload: &[u8], received_at: DateTime<Utc>) -> Result<Record, IngestError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::invalid("empty payload"));
    }

    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| IngestError::invalid(format!("payload is not valid JSON: {}", e)))?;

    let serde_json::Value::Object(object) = value else {
        return Err(IngestError::invalid("payload must be a JSON object"));
    };

    if object.is_empty() {
        return Err(IngestError::invalid("payload has no fields"));
    }

    let mut fields = IndexMap::with_capacity(object.len() + 1);
    fields.insert(
        TIMESTAMP_FIELD.to_string(),
        FieldValue::Text(received_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );

    for (name, value) in object {
        if name == TIMESTAMP_FIELD {
            continue;
        }
        let scalar = FieldValue::from_json(value).ok_or_else(|| {
            IngestError::invalid(format!("field '{}' must be a scalar value", name))
        })?;
        fields.insert(name, scalar);
    }

    Ok(Record::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    fn reason(err: IngestError) -> String {
        match err {
            IngestError::InvalidPayload { reason } => reason,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(reason(validate(b"").unwrap_err()), "empty payload");
        assert_eq!(reason(validate(b"  \n").unwrap_err()), "empty payload");
    }

    #[test]
    fn rejects_unparseable_json() {
        let msg = reason(validate(b"{\"temperature\": ").unwrap_err());
        assert!(msg.starts_with("payload is not valid JSON"), "{msg}");
    }

    #[test]
    fn rejects_non_objects() {
        for payload in [&b"[1,2,3]"[..], b"42", b"\"text\"", b"null"] {
            let msg = reason(validate(payload).unwrap_err());
            assert_eq!(msg, "payload must be a JSON object");
        }
    }

    #[test]
    fn rejects_empty_object() {
        assert_eq!(reason(validate(b"{}").unwrap_err()), "payload has no fields");
    }

    #[test]
    fn rejects_nested_fields() {
        let msg = reason(validate(br#"{"temperature": [21.0, 22.0]}"#).unwrap_err());
        assert_eq!(msg, "field 'temperature' must be a scalar value");
    }

    #[test]
    fn receipt_timestamp_overrides_producer_value() {
        let record = validate_at(
            br#"{"timestamp": "1999-01-01", "device_id": 3, "temperature": 21.5}"#,
            fixed_time(),
        )
        .unwrap();

        assert_eq!(record.timestamp(), "2025-03-14T09:26:53.000000Z");
        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["timestamp", "device_id", "temperature"]);
    }

    #[test]
    fn preserves_producer_field_order() {
        let record = validate(br#"{"snr": 9.5, "rssi": -80, "device_id": 1}"#).unwrap();
        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["timestamp", "snr", "rssi", "device_id"]);
    }
}

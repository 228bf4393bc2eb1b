//! Sink declarations.
//!
//! Routing is by field presence: each sink states which records it accepts
//! instead of the router branching per record.

use crate::record::Record;

/// Which records a sink accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Every record (the raw log).
    Always,
    /// Records carrying a non-null value for at least one of these fields.
    AnyOf(&'static [&'static str]),
}

impl Eligibility {
    pub fn accepts(&self, record: &Record) -> bool {
        match self {
            Eligibility::Always => true,
            Eligibility::AnyOf(fields) => fields.iter().any(|f| record.has_value(f)),
        }
    }
}

/// Fixed-column table sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub signature: &'static [&'static str],
}

impl TableSchema {
    pub fn eligibility(&self) -> Eligibility {
        Eligibility::AnyOf(self.signature)
    }
}

/// BME688/BSEC environmental readings.
pub const ENVIRONMENTAL: TableSchema = TableSchema {
    name: "environmental",
    columns: &[
        "timestamp",
        "device_id",
        "sequence",
        "uptime",
        "temperature",
        "humidity",
        "pressure",
        "iaq",
        "iaq_accuracy",
        "iaq_label",
        "static_iaq",
        "co2_ppm",
        "voc_ppm",
        "gas_percent",
        "stabilized",
        "run_in_complete",
        "rssi",
        "snr",
    ],
    signature: &["temperature", "humidity", "pressure"],
};

/// Raw ADC readings (MQ135 gas sensor, anemometer).
pub const ANALOG: TableSchema = TableSchema {
    name: "analog",
    columns: &[
        "timestamp",
        "device_id",
        "sequence",
        "uptime",
        "mq135",
        "anemometer",
        "rssi",
        "snr",
    ],
    signature: &["mq135", "anemometer"],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn routes_by_signature_presence() {
        let env = validate(br#"{"device_id": 1, "humidity": 40.2}"#).unwrap();
        let analog = validate(br#"{"device_id": 2, "mq135": 512}"#).unwrap();
        let both = validate(br#"{"temperature": 20.0, "anemometer": 88}"#).unwrap();
        let neither = validate(br#"{"device_id": 3, "rssi": -90}"#).unwrap();

        let env_sink = ENVIRONMENTAL.eligibility();
        let analog_sink = ANALOG.eligibility();

        assert!(env_sink.accepts(&env) && !analog_sink.accepts(&env));
        assert!(!env_sink.accepts(&analog) && analog_sink.accepts(&analog));
        assert!(env_sink.accepts(&both) && analog_sink.accepts(&both));
        assert!(!env_sink.accepts(&neither) && !analog_sink.accepts(&neither));
        assert!(Eligibility::Always.accepts(&neither));
    }

    #[test]
    fn null_signature_field_is_absent() {
        let record = validate(br#"{"temperature": null, "rssi": -60}"#).unwrap();
        assert!(!ENVIRONMENTAL.eligibility().accepts(&record));
    }

    #[test]
    fn signatures_are_columns() {
        for schema in [ENVIRONMENTAL, ANALOG] {
            for field in schema.signature {
                assert!(schema.columns.contains(field), "{} missing {}", schema.name, field);
            }
            assert_eq!(schema.columns[0], "timestamp");
        }
    }
}

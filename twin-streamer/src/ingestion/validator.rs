/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Normalizes and validates inbound reading payloads.

use crate::model::{MeasureUnit, SensorReading, SensorType};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Offset applied to producer timestamps when none is configured: UTC-03:00.
pub const DEFAULT_CANONICAL_OFFSET_MINUTES: i32 = -180;

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const OFFSET_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

pub fn canonical_offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Unparseable payload, or a required field missing or of the wrong type.
    MalformedPayload(String),
    /// No water-system id in the payload and no default configured.
    MissingDefaultAsset,
    UnitMismatch {
        sensor: SensorType,
        supplied: String,
        expected: MeasureUnit,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MalformedPayload(reason) => write!(f, "malformed payload: {reason}"),
            ValidationError::MissingDefaultAsset => write!(
                f,
                "reading carries no water system id and no default is configured"
            ),
            ValidationError::UnitMismatch {
                sensor,
                supplied,
                expected,
            } => write!(
                f,
                "invalid measure unit '{supplied}' for sensor type '{sensor}', expected '{expected}'"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Process-wide ingestion settings, injected at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatorConfig {
    pub default_water_system_id: Option<String>,
    pub canonical_offset: FixedOffset,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_water_system_id: None,
            canonical_offset: canonical_offset_from_minutes(DEFAULT_CANONICAL_OFFSET_MINUTES)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Text(String),
    EpochSeconds(f64),
}

#[derive(Deserialize)]
struct WireReading {
    sensor: Option<SensorType>,
    value: Option<f64>,
    #[serde(rename = "measureUnit", alias = "measure_unit")]
    measure_unit: Option<String>,
    #[serde(rename = "createDate", alias = "create_date")]
    create_date: Option<WireTimestamp>,
    #[serde(rename = "sensorId", alias = "sensor_id")]
    sensor_id: Option<String>,
    #[serde(rename = "waterSystemId", alias = "water_system_id")]
    water_system_id: Option<String>,
}

/// Turns wire payloads into [`SensorReading`]s.
///
/// ```
/// use twin_streamer::ingestion::{ReadingValidator, ValidatorConfig};
///
/// let validator = ReadingValidator::new(ValidatorConfig {
///     default_water_system_id: Some("W1".to_string()),
///     ..Default::default()
/// });
/// let reading = validator
///     .validate(br#"{"sensor": "ph", "value": 7.1, "measureUnit": "", "createDate": "2024-05-01T10:00:00"}"#)
///     .unwrap();
/// assert_eq!(reading.water_system_id, "W1");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReadingValidator {
    config: ValidatorConfig,
}

impl ReadingValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(&self, raw: &[u8]) -> Result<SensorReading, ValidationError> {
        let wire: WireReading = serde_json::from_slice(raw)
            .map_err(|err| ValidationError::MalformedPayload(err.to_string()))?;

        let sensor = wire.sensor.ok_or_else(|| missing_field("sensor"))?;
        let value = wire.value.ok_or_else(|| missing_field("value"))?;
        let create_date = wire.create_date.ok_or_else(|| missing_field("createDate"))?;

        let water_system_id = match wire.water_system_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => self
                .config
                .default_water_system_id
                .clone()
                .ok_or(ValidationError::MissingDefaultAsset)?,
        };

        let create_date = self.normalize_timestamp(create_date)?;
        let measure_unit = resolve_unit(sensor, wire.measure_unit.as_deref().unwrap_or(""))?;

        Ok(SensorReading {
            id: None,
            sensor,
            value,
            measure_unit,
            create_date,
            sensor_id: wire.sensor_id,
            water_system_id,
        })
    }

    fn normalize_timestamp(
        &self,
        timestamp: WireTimestamp,
    ) -> Result<DateTime<FixedOffset>, ValidationError> {
        let offset = self.config.canonical_offset;

        match timestamp {
            WireTimestamp::EpochSeconds(seconds) => {
                if !seconds.is_finite() {
                    return Err(ValidationError::MalformedPayload(
                        "createDate is not a finite number".to_string(),
                    ));
                }
                let whole = seconds.floor();
                let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
                DateTime::from_timestamp(whole as i64, nanos)
                    .map(|utc| utc.with_timezone(&offset))
                    .ok_or_else(|| {
                        ValidationError::MalformedPayload(format!(
                            "createDate {seconds} is out of range"
                        ))
                    })
            }
            WireTimestamp::Text(text) => {
                let text = text.trim();
                if let Ok(aware) = DateTime::parse_from_rfc3339(text) {
                    return Ok(aware.with_timezone(&offset));
                }
                for format in OFFSET_TIMESTAMP_FORMATS {
                    if let Ok(aware) = DateTime::parse_from_str(text, format) {
                        return Ok(aware.with_timezone(&offset));
                    }
                }
                for format in NAIVE_TIMESTAMP_FORMATS {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                        if let Some(local) = offset.from_local_datetime(&naive).single() {
                            return Ok(local);
                        }
                    }
                }
                Err(ValidationError::MalformedPayload(format!(
                    "createDate '{text}' is not a recognised timestamp"
                )))
            }
        }
    }
}

fn missing_field(field: &str) -> ValidationError {
    ValidationError::MalformedPayload(format!("missing required field '{field}'"))
}

fn resolve_unit(sensor: SensorType, supplied: &str) -> Result<MeasureUnit, ValidationError> {
    let expected = sensor.expected_unit();
    let mismatch = || ValidationError::UnitMismatch {
        sensor,
        supplied: supplied.to_string(),
        expected,
    };

    let unit = MeasureUnit::from_wire(supplied).ok_or_else(mismatch)?;
    if unit.is_unspecified() || unit == expected {
        Ok(unit)
    } else {
        Err(mismatch())
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadingValidator, ValidationError, ValidatorConfig};
    use crate::model::{MeasureUnit, SensorType};
    use chrono::{FixedOffset, TimeZone};

    fn validator_with_default(default: Option<&str>) -> ReadingValidator {
        ReadingValidator::new(ValidatorConfig {
            default_water_system_id: default.map(str::to_string),
            ..Default::default()
        })
    }

    fn minus_three() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn ph_with_unspecified_unit_validates() {
        let reading = validator_with_default(Some("W1"))
            .validate(
                br#"{"sensor":"ph","value":7.2,"measureUnit":"","createDate":"2024-05-01T10:00:00","sensorId":"S1"}"#,
            )
            .expect("ph reading should validate");

        assert_eq!(reading.sensor, SensorType::Ph);
        assert_eq!(reading.measure_unit, MeasureUnit::Unspecified);
        assert_eq!(reading.sensor_id.as_deref(), Some("S1"));
    }

    #[test]
    fn temperature_in_ntu_is_a_unit_mismatch() {
        let err = validator_with_default(Some("W1"))
            .validate(
                br#"{"sensor":"temperature","value":21.0,"measureUnit":"NTU","createDate":"2024-05-01T10:00:00"}"#,
            )
            .expect_err("NTU is not a temperature unit");

        assert_eq!(
            err,
            ValidationError::UnitMismatch {
                sensor: SensorType::Temperature,
                supplied: "NTU".to_string(),
                expected: MeasureUnit::Celsius,
            }
        );
        let message = err.to_string();
        assert!(message.contains("temperature"));
        assert!(message.contains("NTU"));
        assert!(message.contains("Celsius"));
    }

    #[test]
    fn unknown_unit_is_a_unit_mismatch() {
        let err = validator_with_default(Some("W1"))
            .validate(
                br#"{"sensor":"turbidity","value":3.0,"measureUnit":"FNU","createDate":"2024-05-01T10:00:00"}"#,
            )
            .expect_err("FNU is not accepted");

        assert!(matches!(err, ValidationError::UnitMismatch { .. }));
    }

    #[test]
    fn any_sensor_accepts_the_unspecified_sentinel() {
        let validator = validator_with_default(Some("W1"));
        for sensor in ["temperature", "turbidity", "dissolvedOxygen", "conductivity"] {
            let payload = format!(
                r#"{{"sensor":"{sensor}","value":1.0,"measureUnit":"","createDate":"2024-05-01T10:00:00"}}"#
            );
            let reading = validator
                .validate(payload.as_bytes())
                .expect("unspecified unit is always accepted");
            assert_eq!(reading.measure_unit, MeasureUnit::Unspecified);
        }
    }

    #[test]
    fn missing_unit_defaults_to_unspecified() {
        let reading = validator_with_default(Some("W1"))
            .validate(br#"{"sensor":"conductivity","value":410.0,"createDate":"2024-05-01T10:00:00"}"#)
            .expect("missing unit is the unspecified sentinel");

        assert_eq!(reading.measure_unit, MeasureUnit::Unspecified);
    }

    #[test]
    fn default_water_system_is_substituted() {
        let reading = validator_with_default(Some("W1"))
            .validate(
                br#"{"sensor":"turbidity","value":4.5,"measureUnit":"NTU","createDate":"2024-05-01T10:00:00"}"#,
            )
            .expect("reading should validate");

        assert_eq!(reading.water_system_id, "W1");
    }

    #[test]
    fn supplied_water_system_wins_over_default() {
        let reading = validator_with_default(Some("W1"))
            .validate(
                br#"{"sensor":"turbidity","value":4.5,"measureUnit":"NTU","createDate":"2024-05-01T10:00:00","waterSystemId":"W7"}"#,
            )
            .expect("reading should validate");

        assert_eq!(reading.water_system_id, "W7");
    }

    #[test]
    fn missing_water_system_without_default_fails() {
        let err = validator_with_default(None)
            .validate(br#"{"sensor":"ph","value":7.0,"createDate":"2024-05-01T10:00:00"}"#)
            .expect_err("no water system id is resolvable");

        assert_eq!(err, ValidationError::MissingDefaultAsset);
    }

    #[test]
    fn missing_or_malformed_required_fields_are_malformed_payloads() {
        let validator = validator_with_default(Some("W1"));
        let payloads: [&[u8]; 6] = [
            br#"{"value":7.0,"createDate":"2024-05-01T10:00:00"}"#,
            br#"{"sensor":"ph","createDate":"2024-05-01T10:00:00"}"#,
            br#"{"sensor":"ph","value":7.0}"#,
            br#"{"sensor":"ph","value":"seven","createDate":"2024-05-01T10:00:00"}"#,
            br#"{"sensor":"salinity","value":7.0,"createDate":"2024-05-01T10:00:00"}"#,
            b"not json",
        ];

        for payload in payloads {
            assert!(matches!(
                validator.validate(payload),
                Err(ValidationError::MalformedPayload(_))
            ));
        }

        assert!(matches!(
            validator.validate(br#"{"sensor":"ph","value":7.0,"createDate":"yesterday"}"#),
            Err(ValidationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn naive_timestamp_gets_canonical_offset_attached() {
        let reading = validator_with_default(Some("W1"))
            .validate(br#"{"sensor":"ph","value":7.0,"createDate":"2024-05-01T10:00:00"}"#)
            .expect("reading should validate");

        assert_eq!(
            reading.create_date,
            minus_three().with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(reading.create_date.offset(), &minus_three());
    }

    #[test]
    fn aware_timestamp_is_converted_to_canonical_offset() {
        let reading = validator_with_default(Some("W1"))
            .validate(br#"{"sensor":"ph","value":7.0,"createDate":"2024-05-01T13:00:00Z"}"#)
            .expect("reading should validate");

        assert_eq!(reading.create_date.offset(), &minus_three());
        assert_eq!(
            reading.create_date.naive_local(),
            minus_three()
                .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
                .unwrap()
                .naive_local()
        );
    }

    #[test]
    fn epoch_seconds_are_accepted() {
        let reading = validator_with_default(Some("W1"))
            .validate(br#"{"sensor":"ph","value":7.0,"createDate":1714568400}"#)
            .expect("epoch timestamp should validate");

        // 1714568400 is 2024-05-01T13:00:00Z.
        assert_eq!(
            reading.create_date,
            minus_three().with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
    }
}

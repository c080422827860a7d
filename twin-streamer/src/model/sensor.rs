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

//! Sensor-level vocabulary: sensor kinds, measurement units and the per-sensor twin slot.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of physical sensor reporting into a water system.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum SensorType {
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "ph")]
    Ph,
    #[serde(rename = "turbidity")]
    Turbidity,
    #[serde(rename = "dissolvedOxygen")]
    DissolvedOxygen,
    #[serde(rename = "conductivity")]
    Conductivity,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Ph => "ph",
            SensorType::Turbidity => "turbidity",
            SensorType::DissolvedOxygen => "dissolvedOxygen",
            SensorType::Conductivity => "conductivity",
        }
    }

    /// Canonical unit a producer must report for this sensor kind.
    ///
    /// pH is dimensionless, so its canonical unit is the unspecified sentinel.
    pub fn expected_unit(&self) -> MeasureUnit {
        match self {
            SensorType::Temperature => MeasureUnit::Celsius,
            SensorType::Ph => MeasureUnit::Unspecified,
            SensorType::Turbidity => MeasureUnit::Ntu,
            SensorType::DissolvedOxygen => MeasureUnit::MilligramsPerLiter,
            SensorType::Conductivity => MeasureUnit::MicrosiemensPerCentimeter,
        }
    }
}

impl Display for SensorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement unit attached to a reading or a sensor twin.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum MeasureUnit {
    #[serde(rename = "Celsius", alias = "Celcius")]
    Celsius,
    #[serde(rename = "NTU")]
    Ntu,
    #[serde(rename = "mg/L")]
    MilligramsPerLiter,
    #[serde(rename = "µS/cm")]
    MicrosiemensPerCentimeter,
    /// Sentinel for "no unit supplied"; accepted for every sensor type.
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl MeasureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureUnit::Celsius => "Celsius",
            MeasureUnit::Ntu => "NTU",
            MeasureUnit::MilligramsPerLiter => "mg/L",
            MeasureUnit::MicrosiemensPerCentimeter => "µS/cm",
            MeasureUnit::Unspecified => "",
        }
    }

    /// Resolves a wire-level unit string. Producers in the field still send the
    /// historical `Celcius` spelling, which maps to [`MeasureUnit::Celsius`].
    pub fn from_wire(unit: &str) -> Option<Self> {
        match unit {
            "Celsius" | "Celcius" => Some(MeasureUnit::Celsius),
            "NTU" => Some(MeasureUnit::Ntu),
            "mg/L" => Some(MeasureUnit::MilligramsPerLiter),
            "µS/cm" => Some(MeasureUnit::MicrosiemensPerCentimeter),
            "" => Some(MeasureUnit::Unspecified),
            _ => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, MeasureUnit::Unspecified)
    }
}

impl Display for MeasureUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureUnit::Unspecified => f.write_str("none"),
            unit => f.write_str(unit.as_str()),
        }
    }
}

/// Rolled-up window statistics for one sensor twin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorStatistics {
    pub mean_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub last_value: f64,
    pub last_value_date: DateTime<FixedOffset>,
    pub last_updated: DateTime<Utc>,
}

/// Per-sensor slot on a monitored asset.
///
/// `statistics` stays `None` until an aggregation cycle has seen readings for the sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorTwin {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub unit: MeasureUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<SensorStatistics>,
}

impl SensorTwin {
    pub fn new(sensor_id: &str, sensor_type: SensorType) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            sensor_type,
            unit: sensor_type.expected_unit(),
            statistics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MeasureUnit, SensorTwin, SensorType};

    #[test]
    fn expected_units_follow_sensor_kind() {
        assert_eq!(SensorType::Temperature.expected_unit(), MeasureUnit::Celsius);
        assert_eq!(SensorType::Ph.expected_unit(), MeasureUnit::Unspecified);
        assert_eq!(SensorType::Turbidity.expected_unit(), MeasureUnit::Ntu);
        assert_eq!(
            SensorType::DissolvedOxygen.expected_unit(),
            MeasureUnit::MilligramsPerLiter
        );
        assert_eq!(
            SensorType::Conductivity.expected_unit(),
            MeasureUnit::MicrosiemensPerCentimeter
        );
    }

    #[test]
    fn legacy_celsius_spelling_resolves_to_celsius() {
        assert_eq!(MeasureUnit::from_wire("Celcius"), Some(MeasureUnit::Celsius));
        assert_eq!(MeasureUnit::from_wire("Celsius"), Some(MeasureUnit::Celsius));
        assert_eq!(MeasureUnit::from_wire("kelvin"), None);

        let unit: MeasureUnit = serde_json::from_str("\"Celcius\"").expect("alias should parse");
        assert_eq!(unit, MeasureUnit::Celsius);
    }

    #[test]
    fn sensor_type_uses_producer_wire_names() {
        let sensor: SensorType =
            serde_json::from_str("\"dissolvedOxygen\"").expect("wire name should parse");
        assert_eq!(sensor, SensorType::DissolvedOxygen);
        assert_eq!(
            serde_json::to_string(&SensorType::Ph).expect("serialize"),
            "\"ph\""
        );
    }

    #[test]
    fn new_sensor_twin_carries_canonical_unit_and_no_statistics() {
        let twin = SensorTwin::new("S1", SensorType::Turbidity);

        assert_eq!(twin.unit, MeasureUnit::Ntu);
        assert!(twin.statistics.is_none());
    }
}

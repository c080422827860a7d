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

//! Monitored-asset (digital twin) record and its management-boundary validation.

use crate::model::sensor::{SensorTwin, SensorType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Shortest lookback window a twin may be configured with.
pub const MIN_TWINNING_INTERVAL_SECONDS: u64 = 60;

/// Status value of assets picked up by the aggregation cycle.
pub const STATUS_ONLINE: &str = "online";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Reservoir,
    Treatment,
}

/// Failures when a twin record violates its invariants.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AssetValidationError {
    TwinningIntervalTooShort(u64),
    EmptySensorId,
    DuplicateSensorId(String),
}

impl Display for AssetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetValidationError::TwinningIntervalTooShort(seconds) => write!(
                f,
                "twinning interval of {seconds}s is below the minimum of {MIN_TWINNING_INTERVAL_SECONDS}s"
            ),
            AssetValidationError::EmptySensorId => write!(f, "sensor id must not be empty"),
            AssetValidationError::DuplicateSensorId(sensor_id) => {
                write!(f, "sensor id '{sensor_id}' is declared more than once")
            }
        }
    }
}

impl Error for AssetValidationError {}

fn default_status() -> String {
    STATUS_ONLINE.to_string()
}

/// Persisted digital twin of a physical water system.
///
/// The id is assigned by the twin store on creation and is `None` until then.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoredAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity_cubic_meters: Option<f64>,
    pub system_type: AssetType,
    #[serde(default = "default_status")]
    pub status: String,
    pub twinning_interval_seconds: u64,
    #[serde(default)]
    pub sensors: Vec<SensorTwin>,
}

impl MonitoredAsset {
    pub fn new(name: &str, system_type: AssetType, twinning_interval_seconds: u64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            location: None,
            capacity_cubic_meters: None,
            system_type,
            status: default_status(),
            twinning_interval_seconds,
            sensors: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Declares a sensor on the twin. Telemetry for a sensor is only aggregated once it
    /// has been declared here.
    pub fn add_sensor(&mut self, sensor_id: &str, sensor_type: SensorType) -> &mut SensorTwin {
        self.sensors.push(SensorTwin::new(sensor_id, sensor_type));
        let last = self.sensors.len() - 1;
        &mut self.sensors[last]
    }

    pub fn sensor(&self, sensor_id: &str) -> Option<&SensorTwin> {
        self.sensors
            .iter()
            .find(|sensor| sensor.sensor_id == sensor_id)
    }

    pub(crate) fn sensor_mut(&mut self, sensor_id: &str) -> Option<&mut SensorTwin> {
        self.sensors
            .iter_mut()
            .find(|sensor| sensor.sensor_id == sensor_id)
    }

    pub fn is_online(&self) -> bool {
        self.status == STATUS_ONLINE
    }

    pub fn twinning_window(&self) -> Duration {
        Duration::from_secs(self.twinning_interval_seconds)
    }

    /// Checks the invariants enforced at the management boundary.
    pub fn validate(&self) -> Result<(), AssetValidationError> {
        if self.twinning_interval_seconds < MIN_TWINNING_INTERVAL_SECONDS {
            return Err(AssetValidationError::TwinningIntervalTooShort(
                self.twinning_interval_seconds,
            ));
        }

        let mut seen = HashSet::with_capacity(self.sensors.len());
        for sensor in &self.sensors {
            if sensor.sensor_id.trim().is_empty() {
                return Err(AssetValidationError::EmptySensorId);
            }
            if !seen.insert(sensor.sensor_id.as_str()) {
                return Err(AssetValidationError::DuplicateSensorId(
                    sensor.sensor_id.clone(),
                ));
            }
        }

        Ok(())
    }
}

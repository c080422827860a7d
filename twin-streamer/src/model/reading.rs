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

//! Validated telemetry sample as persisted by the reading store.

use crate::model::sensor::{MeasureUnit, SensorType};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One validated reading. Immutable once created; corrections arrive as new readings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sensor: SensorType,
    pub value: f64,
    pub measure_unit: MeasureUnit,
    /// Producer timestamp, normalized to the canonical offset at ingestion.
    pub create_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub sensor_id: Option<String>,
    pub water_system_id: String,
}

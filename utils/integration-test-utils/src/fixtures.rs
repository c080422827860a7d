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

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::time::Duration;
use twin_streamer::model::{AssetType, MonitoredAsset, SensorType};

/// Builds wire payloads the way sensor producers publish them.
#[derive(Clone, Debug)]
pub struct ReadingPayload {
    fields: Map<String, Value>,
}

impl ReadingPayload {
    /// A payload with the three required fields set.
    pub fn new(sensor: &str, value: f64, create_date: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("sensor".to_string(), json!(sensor));
        fields.insert("value".to_string(), json!(value));
        fields.insert("createDate".to_string(), json!(create_date));
        Self { fields }
    }

    /// Shorthand for a payload stamped with an offset-aware timestamp.
    pub fn at(sensor: &str, value: f64, create_date: DateTime<FixedOffset>) -> Self {
        Self::new(sensor, value, &create_date.to_rfc3339())
    }

    pub fn unit(self, unit: &str) -> Self {
        self.with("measureUnit", json!(unit))
    }

    pub fn sensor_id(self, sensor_id: &str) -> Self {
        self.with("sensorId", json!(sensor_id))
    }

    pub fn water_system(self, water_system_id: &str) -> Self {
        self.with("waterSystemId", json!(water_system_id))
    }

    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        Value::Object(self.fields.clone()).to_string().into_bytes()
    }
}

/// An online asset with id `id` and the given declared sensors.
pub fn asset_with_sensors(
    id: &str,
    twinning_interval_seconds: u64,
    sensors: &[(&str, SensorType)],
) -> MonitoredAsset {
    let mut asset = MonitoredAsset::new(
        &format!("{id} water system"),
        AssetType::Reservoir,
        twinning_interval_seconds,
    )
    .with_id(id);
    for (sensor_id, sensor_type) in sensors {
        asset.add_sensor(sensor_id, *sensor_type);
    }
    asset
}

/// Polls `condition` until it holds or `timeout` elapses. Returns the final verdict.
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

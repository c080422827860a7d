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

//! Window aggregation: folds one asset's readings into per-sensor statistics.

use crate::model::{MonitoredAsset, SensorReading, SensorStatistics};
use crate::observability::{events, fields};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::{debug, warn};

const COMPONENT: &str = "aggregator";

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AggregationError {
    /// Telemetry references a sensor the twin does not declare.
    UnmatchedSensor {
        water_system_id: String,
        sensor_id: String,
    },
}

impl Display for AggregationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::UnmatchedSensor {
                water_system_id,
                sensor_id,
            } => write!(
                f,
                "sensor '{sensor_id}' is not declared on water system '{water_system_id}'"
            ),
        }
    }
}

impl Error for AggregationError {}

/// [`aggregate_at`] stamped with the current wall-clock time.
pub fn aggregate(
    asset: &MonitoredAsset,
    readings: &[SensorReading],
) -> Result<MonitoredAsset, AggregationError> {
    aggregate_at(asset, readings, Utc::now())
}

/// Returns a copy of `asset` whose sensor statistics reflect `readings`.
///
/// Readings are grouped by sensor id and ordered by `create_date` (stable, so ties keep
/// arrival order). Sensors without readings keep their previous statistics. If any group
/// names a sensor the asset does not declare, nothing is merged and
/// [`AggregationError::UnmatchedSensor`] is returned for the lowest such sensor id.
///
/// ```
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use twin_streamer::aggregation::aggregate_at;
/// use twin_streamer::model::{AssetType, MeasureUnit, MonitoredAsset, SensorReading, SensorType};
///
/// let mut asset = MonitoredAsset::new("North reservoir", AssetType::Reservoir, 300).with_id("W1");
/// asset.add_sensor("S1", SensorType::Ph);
///
/// let offset = FixedOffset::west_opt(3 * 3600).unwrap();
/// let readings: Vec<SensorReading> = [(10.0, 0), (20.0, 1), (30.0, 2)]
///     .into_iter()
///     .map(|(value, minute)| SensorReading {
///         id: None,
///         sensor: SensorType::Ph,
///         value,
///         measure_unit: MeasureUnit::Unspecified,
///         create_date: offset.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap(),
///         sensor_id: Some("S1".to_string()),
///         water_system_id: "W1".to_string(),
///     })
///     .collect();
///
/// let updated = aggregate_at(&asset, &readings, Utc::now()).unwrap();
/// let stats = updated.sensor("S1").unwrap().statistics.as_ref().unwrap();
/// assert_eq!((stats.mean_value, stats.min_value, stats.max_value), (20.0, 10.0, 30.0));
/// assert_eq!(stats.last_value, 30.0);
/// ```
pub fn aggregate_at(
    asset: &MonitoredAsset,
    readings: &[SensorReading],
    now: DateTime<Utc>,
) -> Result<MonitoredAsset, AggregationError> {
    let water_system_id = asset.id.as_deref().unwrap_or(asset.name.as_str());

    if readings.is_empty() {
        warn!(
            event = events::ASSET_EMPTY_WINDOW,
            component = COMPONENT,
            water_system_id,
            "no readings in window; twin left unchanged"
        );
        return Ok(asset.clone());
    }

    let mut groups: BTreeMap<&str, Vec<&SensorReading>> = BTreeMap::new();
    let mut unattributed = 0usize;
    for reading in readings {
        match reading.sensor_id.as_deref() {
            Some(sensor_id) => groups.entry(sensor_id).or_default().push(reading),
            None => unattributed += 1,
        }
    }

    if unattributed > 0 {
        debug!(
            event = events::READING_WITHOUT_SENSOR_ID,
            component = COMPONENT,
            water_system_id,
            ignored = unattributed,
            "ignoring readings without a sensor id"
        );
    }

    if let Some(sensor_id) = groups
        .keys()
        .find(|sensor_id| asset.sensor(sensor_id).is_none())
    {
        return Err(AggregationError::UnmatchedSensor {
            water_system_id: water_system_id.to_string(),
            sensor_id: sensor_id.to_string(),
        });
    }

    let mut updated = asset.clone();
    for (sensor_id, mut group) in groups {
        group.sort_by(|left, right| left.create_date.cmp(&right.create_date));
        if let (Some(statistics), Some(twin)) = (
            window_statistics(&group, now),
            updated.sensor_mut(sensor_id),
        ) {
            twin.statistics = Some(statistics);
        }
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            event = events::ASSET_AGGREGATED,
            component = COMPONENT,
            water_system_id,
            readings = readings.len(),
            ignored = unattributed,
            last_updated = fields::format_timestamp(&now),
            "window aggregated"
        );
    }
    Ok(updated)
}

/// Statistics over a chronologically ordered group; `None` for an empty group.
fn window_statistics(
    ordered: &[&SensorReading],
    now: DateTime<Utc>,
) -> Option<SensorStatistics> {
    let last = ordered.last()?;
    let (sum, min_value, max_value) = ordered.iter().fold(
        (0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min_value, max_value), reading| {
            (
                sum + reading.value,
                min_value.min(reading.value),
                max_value.max(reading.value),
            )
        },
    );

    Some(SensorStatistics {
        mean_value: sum / ordered.len() as f64,
        min_value,
        max_value,
        last_value: last.value,
        last_value_date: last.create_date,
        last_updated: now,
    })
}

#[cfg(test)]
mod tests {
    use super::{aggregate, aggregate_at, AggregationError};
    use crate::model::{
        AssetType, MeasureUnit, MonitoredAsset, SensorReading, SensorStatistics, SensorType,
    };
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, 9, minute, 0)
            .unwrap()
    }

    fn reading(sensor_id: Option<&str>, value: f64, minute: u32) -> SensorReading {
        SensorReading {
            id: None,
            sensor: SensorType::Turbidity,
            value,
            measure_unit: MeasureUnit::Ntu,
            create_date: at(minute),
            sensor_id: sensor_id.map(str::to_string),
            water_system_id: "W1".to_string(),
        }
    }

    fn asset() -> MonitoredAsset {
        let mut asset = MonitoredAsset::new("Plant", AssetType::Treatment, 600).with_id("W1");
        asset.add_sensor("S1", SensorType::Turbidity);
        asset.add_sensor("S2", SensorType::Turbidity);
        asset
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn computes_window_statistics_per_sensor() {
        let readings = vec![
            reading(Some("S1"), 10.0, 0),
            reading(Some("S1"), 20.0, 1),
            reading(Some("S1"), 30.0, 2),
        ];

        let updated = aggregate_at(&asset(), &readings, now()).unwrap();

        assert_eq!(
            updated.sensor("S1").unwrap().statistics,
            Some(SensorStatistics {
                mean_value: 20.0,
                min_value: 10.0,
                max_value: 30.0,
                last_value: 30.0,
                last_value_date: at(2),
                last_updated: now(),
            })
        );
        assert!(updated.sensor("S2").unwrap().statistics.is_none());
    }

    #[test]
    fn last_value_follows_timestamps_not_arrival_order() {
        let readings = vec![
            reading(Some("S1"), 5.0, 7),
            reading(Some("S1"), 1.0, 3),
            reading(Some("S1"), 9.0, 5),
        ];

        let updated = aggregate_at(&asset(), &readings, now()).unwrap();
        let stats = updated.sensor("S1").unwrap().statistics.clone().unwrap();

        assert_eq!(stats.last_value, 5.0);
        assert_eq!(stats.last_value_date, at(7));
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let readings = vec![reading(Some("S1"), 1.0, 4), reading(Some("S1"), 2.0, 4)];

        let updated = aggregate_at(&asset(), &readings, now()).unwrap();

        assert_eq!(
            updated.sensor("S1").unwrap().statistics.as_ref().unwrap().last_value,
            2.0
        );
    }

    #[test]
    fn empty_window_returns_identical_asset() {
        let mut original = asset();
        original.sensor_mut("S1").unwrap().statistics = Some(SensorStatistics {
            mean_value: 1.0,
            min_value: 1.0,
            max_value: 1.0,
            last_value: 1.0,
            last_value_date: at(0),
            last_updated: now(),
        });

        assert_eq!(aggregate(&original, &[]).unwrap(), original);
    }

    #[test]
    fn unmatched_sensor_aborts_without_touching_other_sensors() {
        let original = asset();
        let readings = vec![
            reading(Some("S1"), 10.0, 0),
            reading(Some("S9"), 3.0, 1),
            reading(Some("S7"), 4.0, 2),
        ];

        let err = aggregate_at(&original, &readings, now()).unwrap_err();

        assert_eq!(
            err,
            AggregationError::UnmatchedSensor {
                water_system_id: "W1".to_string(),
                sensor_id: "S7".to_string(),
            }
        );
        assert!(original.sensor("S1").unwrap().statistics.is_none());
    }

    #[test]
    fn readings_without_sensor_id_are_ignored() {
        let readings = vec![reading(None, 99.0, 0), reading(Some("S2"), 4.0, 1)];

        let updated = aggregate_at(&asset(), &readings, now()).unwrap();

        assert_eq!(
            updated.sensor("S2").unwrap().statistics.as_ref().unwrap().max_value,
            4.0
        );
        assert!(updated.sensor("S1").unwrap().statistics.is_none());
    }
}

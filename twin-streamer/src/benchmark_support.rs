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

//! Deterministic benchmark fixtures for the Criterion harness.

use crate::aggregation::aggregate_at;
use crate::data_plane::dispatch_worker::{DispatchOutcome, DispatchWorker};
use crate::ingestion::ValidatorConfig;
use crate::model::{AssetType, MeasureUnit, MonitoredAsset, SensorReading, SensorType};
use crate::routing::handler_registry::HandlerRegistry;
use crate::routing::{matches, HandlerError, TopicHandler, TopicPattern, TopicPatternError};
use crate::transport::{DeliveryListener, TelemetryTransport, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NAMESPACE: &str = "plant";

fn sensor_id(index: usize) -> String {
    format!("S{index:03}")
}

/// Fixed fixture for `topic_matching/*` benchmark IDs.
pub struct TopicMatchFixture {
    patterns: Vec<String>,
    topics: Vec<String>,
}

impl TopicMatchFixture {
    pub fn new(rows: usize) -> Self {
        let total_rows = rows.max(1);
        let mut patterns = Vec::with_capacity(total_rows);
        let mut topics = Vec::with_capacity(total_rows);

        for index in 0..total_rows {
            patterns.push(match index % 3 {
                0 => format!("{NAMESPACE}/+"),
                1 => format!("{NAMESPACE}/site-{index}/#"),
                _ => format!("{NAMESPACE}/site-{index}/{}", sensor_id(index)),
            });
            topics.push(format!("{NAMESPACE}/site-{index}/{}", sensor_id(index)));
        }

        Self { patterns, topics }
    }

    pub fn match_count(&self) -> usize {
        self.patterns
            .iter()
            .zip(&self.topics)
            .filter(|(pattern, topic)| matches(pattern, topic))
            .count()
    }
}

/// Fixed fixture for `window_aggregation/*` benchmark IDs.
pub struct AggregationFixture {
    asset: MonitoredAsset,
    readings: Vec<SensorReading>,
    now: DateTime<Utc>,
}

impl AggregationFixture {
    pub fn new(sensors: usize, readings_per_sensor: usize) -> Self {
        let sensors = sensors.max(1);
        let offset = ValidatorConfig::default().canonical_offset;
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();

        let mut asset =
            MonitoredAsset::new("benchmark reservoir", AssetType::Reservoir, 3600).with_id("W1");
        for index in 0..sensors {
            asset.add_sensor(&sensor_id(index), SensorType::Temperature);
        }

        let mut readings = Vec::with_capacity(sensors * readings_per_sensor);
        for step in 0..readings_per_sensor {
            for index in 0..sensors {
                // Interleave timestamps so each group needs reordering.
                let seconds_ago = ((step * 7 + index) % readings_per_sensor.max(1)) as i64;
                readings.push(SensorReading {
                    id: None,
                    sensor: SensorType::Temperature,
                    value: 15.0 + (step % 10) as f64,
                    measure_unit: MeasureUnit::Celsius,
                    create_date: (now - TimeDelta::seconds(seconds_ago)).with_timezone(&offset),
                    sensor_id: Some(sensor_id(index)),
                    water_system_id: "W1".to_string(),
                });
            }
        }

        Self {
            asset,
            readings,
            now,
        }
    }

    /// Runs one aggregation and returns how many sensors ended up with statistics.
    pub fn aggregate_once(&self) -> usize {
        aggregate_at(&self.asset, &self.readings, self.now)
            .map(|asset| {
                asset
                    .sensors
                    .iter()
                    .filter(|sensor| sensor.statistics.is_some())
                    .count()
            })
            .unwrap_or(0)
    }
}

struct NoopTransport;

#[async_trait]
impl TelemetryTransport for NoopTransport {
    async fn connect(&self, _listener: Arc<dyn DeliveryListener>) -> Result<(), TransportError> {
        Ok(())
    }

    async fn subscribe(&self, _pattern: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
}

#[async_trait]
impl TopicHandler for CountingHandler {
    async fn handle(&self, _topic: &str, _payload: &[u8]) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Fixed fixture for `dispatch/*` benchmark IDs: the matching binding is registered last.
pub struct DispatchFixture {
    worker: DispatchWorker,
    handler: Arc<CountingHandler>,
    topic: String,
}

impl DispatchFixture {
    pub fn new(patterns: usize) -> Result<Self, TopicPatternError> {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(CountingHandler::default());

        for index in 0..patterns {
            registry.register(
                TopicPattern::parse(&format!("{NAMESPACE}/site-{index}/+"))?,
                handler.clone(),
            );
        }
        registry.register(
            TopicPattern::parse(&format!("{NAMESPACE}/+"))?,
            handler.clone(),
        );

        Ok(Self {
            worker: DispatchWorker::new("benchmark", registry, Arc::new(NoopTransport)),
            handler,
            topic: format!("{NAMESPACE}/{}", sensor_id(0)),
        })
    }

    /// Dispatches one message and returns the total number of handled messages so far.
    pub async fn dispatch_once(&self) -> usize {
        let outcome = self.worker.dispatch(&self.topic, b"{}").await;
        debug_assert_eq!(outcome, DispatchOutcome::Handled);
        self.handler.calls.load(Ordering::Relaxed)
    }
}

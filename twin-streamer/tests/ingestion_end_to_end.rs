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

mod support;

use chrono::{FixedOffset, TimeZone};
use integration_test_utils::{ReadingPayload, ScriptedTransport, UnavailableReadingStore};
use std::sync::Arc;
use support::{sensor_topic, start_ingestion_pipeline};
use twin_streamer::ingestion::{
    sensor_topic_pattern, ReadingIngestHandler, ReadingValidator, ValidatorConfig,
};
use twin_streamer::model::{MeasureUnit, SensorType};
use twin_streamer::store::{ReadingFilter, ReadingStore};
use twin_streamer::IngestionDispatcher;

#[tokio::test(flavor = "multi_thread")]
async fn valid_readings_are_persisted_in_canonical_offset() {
    integration_test_utils::init_logging();
    let pipeline = start_ingestion_pipeline(Some("reservoir-north")).await;

    pipeline.transport.deliver_from_network_thread(vec![
        (
            sensor_topic("ph-01"),
            ReadingPayload::new("ph", 7.2, "2024-05-01T10:00:00")
                .sensor_id("ph-01")
                .to_bytes(),
        ),
        (
            sensor_topic("temp-01"),
            ReadingPayload::new("temperature", 18.5, "2024-05-01T13:00:00Z")
                .unit("Celcius")
                .sensor_id("temp-01")
                .water_system("treatment-central")
                .to_bytes(),
        ),
    ]);
    let report = pipeline.dispatcher.stop().await.unwrap();
    assert_eq!(report.handled, 2);

    let canonical = FixedOffset::west_opt(3 * 3600).unwrap();
    let north = pipeline
        .readings
        .find(&ReadingFilter::for_water_system("reservoir-north"))
        .await
        .unwrap();
    assert_eq!(north.len(), 1);
    assert_eq!(north[0].sensor, SensorType::Ph);
    assert_eq!(north[0].measure_unit, MeasureUnit::Unspecified);
    assert_eq!(
        north[0].create_date,
        canonical.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    );
    assert!(north[0].id.is_some());

    let central = pipeline
        .readings
        .find(&ReadingFilter::for_water_system("treatment-central"))
        .await
        .unwrap();
    assert_eq!(central.len(), 1);
    assert_eq!(central[0].measure_unit, MeasureUnit::Celsius);
    assert_eq!(central[0].create_date.offset(), &canonical);
    assert_eq!(
        central[0].create_date,
        canonical.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_readings_are_dropped_and_stream_continues() {
    integration_test_utils::init_logging();
    let pipeline = start_ingestion_pipeline(None).await;

    pipeline.transport.deliver_from_network_thread(vec![
        (sensor_topic("s1"), b"not json".to_vec()),
        (
            sensor_topic("s2"),
            ReadingPayload::new("turbidity", 3.0, "2024-05-01T10:00:00")
                .unit("Celsius")
                .water_system("W1")
                .to_bytes(),
        ),
        (
            sensor_topic("s3"),
            ReadingPayload::new("ph", 7.0, "2024-05-01T10:00:00").to_bytes(),
        ),
        (
            sensor_topic("s4"),
            ReadingPayload::new("ph", 7.0, "2024-05-01T10:00:00")
                .water_system("W1")
                .without("value")
                .to_bytes(),
        ),
        (
            sensor_topic("s5"),
            ReadingPayload::new("turbidity", 3.0, "2024-05-01T10:00:00")
                .unit("NTU")
                .water_system("W1")
                .to_bytes(),
        ),
    ]);
    let report = pipeline.dispatcher.stop().await.unwrap();

    assert_eq!(report.failed, 4);
    assert_eq!(report.handled, 1);
    let stored = pipeline
        .readings
        .find(&ReadingFilter::for_water_system("W1"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].measure_unit, MeasureUnit::Ntu);
}

#[tokio::test(flavor = "multi_thread")]
async fn topics_outside_the_namespace_are_not_ingested() {
    integration_test_utils::init_logging();
    let pipeline = start_ingestion_pipeline(Some("W1")).await;
    let payload = ReadingPayload::new("ph", 7.0, "2024-05-01T10:00:00").to_bytes();

    pipeline.transport.deliver_from_network_thread(vec![
        ("water/sensors/a/b".to_string(), payload.clone()),
        ("water/other/a".to_string(), payload.clone()),
        (sensor_topic("a"), payload),
    ]);
    let report = pipeline.dispatcher.stop().await.unwrap();

    assert_eq!(report.unmatched, 2);
    assert_eq!(pipeline.readings.len().await, 1);
    assert_eq!(
        pipeline.transport.subscriptions(),
        [sensor_topic_pattern(support::NAMESPACE)]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_reading_store_drops_message_without_stalling() {
    integration_test_utils::init_logging();
    let transport = Arc::new(ScriptedTransport::new());
    let dispatcher = IngestionDispatcher::new("store-down", transport.clone(), 16);
    let validator = ReadingValidator::new(ValidatorConfig {
        default_water_system_id: Some("W1".to_string()),
        ..Default::default()
    });
    dispatcher
        .register(
            &sensor_topic_pattern(support::NAMESPACE),
            Arc::new(ReadingIngestHandler::new(
                validator,
                Arc::new(UnavailableReadingStore),
            )),
        )
        .await
        .unwrap();
    dispatcher.connect().await.unwrap();
    dispatcher.start().await.unwrap();

    let payload = ReadingPayload::new("ph", 7.0, "2024-05-01T10:00:00").to_bytes();
    transport.deliver_from_network_thread(vec![
        (sensor_topic("a"), payload.clone()),
        (sensor_topic("b"), payload),
    ]);
    let report = dispatcher.stop().await.unwrap();

    assert_eq!(report.failed, 2);
    assert_eq!(report.handled, 0);
}

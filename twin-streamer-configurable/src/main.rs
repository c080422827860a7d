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

mod config;

use crate::config::Config;
use anyhow::{anyhow, Context};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use twin_store_static_file::{InMemoryReadingStore, TwinStoreStaticFile};
use twin_streamer::aggregation::{AggregationCycle, AggregationScheduler};
use twin_streamer::ingestion::{
    canonical_offset_from_minutes, sensor_topic_pattern, ReadingIngestHandler, ReadingValidator,
    ValidatorConfig,
};
use twin_streamer::transport::ConnectionState;
use twin_streamer::IngestionDispatcher;
use twin_streamer_mqtt::{MqttTelemetryTransport, MqttTransportOptions};

#[derive(Parser)]
#[command()]
struct StreamerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started twin-streamer-configurable");

    let args = StreamerArgs::parse();
    let contents = std::fs::read_to_string(&args.config)
        .with_context(|| format!("unable to read config file '{}'", args.config))?;
    let config = Config::from_json5(&contents).context("unable to parse config file")?;
    config.validate()?;

    let streamer_config = &config.twin_streamer_config;
    let canonical_offset = canonical_offset_from_minutes(streamer_config.utc_offset_minutes)
        .ok_or_else(|| anyhow!("utc_offset_minutes is not a valid offset"))?;
    let validator = ReadingValidator::new(ValidatorConfig {
        default_water_system_id: streamer_config.default_water_system_id.clone(),
        canonical_offset,
    });

    let readings = Arc::new(InMemoryReadingStore::new());
    let twins = Arc::new(match &config.store.seed_file {
        Some(seed_file) => TwinStoreStaticFile::from_static_file(seed_file)
            .with_context(|| format!("unable to seed twins from '{}'", seed_file.display()))?,
        None => TwinStoreStaticFile::new(),
    });

    let transport = Arc::new(MqttTelemetryTransport::new(
        MqttTransportOptions::new(
            &config.mqtt.hostname,
            config.mqtt.port,
            &config.mqtt.client_id,
        )
        .with_keep_alive(config.mqtt.keep_alive()),
    ));

    let dispatcher = Arc::new(IngestionDispatcher::new(
        &streamer_config.name,
        transport,
        streamer_config.message_queue_size,
    ));
    dispatcher
        .register(
            &sensor_topic_pattern(&config.ingestion.topic_namespace),
            Arc::new(ReadingIngestHandler::new(validator, readings.clone())),
        )
        .await?;
    dispatcher.start().await?;

    if let Err(err) = dispatcher.connect().await {
        warn!(
            err = %err,
            retry_in_secs = config.mqtt.reconnect_delay_seconds,
            "initial broker connection failed"
        );
    }
    let reconnect = tokio::spawn(reconnect_on_loss(
        dispatcher.clone(),
        config.mqtt.reconnect_delay(),
        dispatcher.connection_state(),
    ));

    let cycle = Arc::new(AggregationCycle::new(readings, twins));
    let scheduler = AggregationScheduler::new(cycle, config.aggregation_period())?.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("unable to listen for shutdown signal")?;
    info!("Shutting down twin-streamer-configurable");

    reconnect.abort();
    let ticks = scheduler.stop().await;
    let report = dispatcher.stop().await?;
    info!(
        ticks,
        handled = report.handled,
        failed = report.failed,
        unmatched = report.unmatched,
        "twin-streamer-configurable stopped"
    );

    Ok(())
}

/// Reconnects after a fixed delay whenever the connection is reported lost.
async fn reconnect_on_loss(
    dispatcher: Arc<IngestionDispatcher>,
    delay: Duration,
    mut state: watch::Receiver<ConnectionState>,
) {
    loop {
        let lost = matches!(*state.borrow_and_update(), ConnectionState::Lost(_));
        if lost {
            tokio::time::sleep(delay).await;
            info!(dispatcher = dispatcher.name(), "reconnecting to broker");
            if let Err(err) = dispatcher.connect().await {
                warn!(err = %err, "reconnect attempt failed");
                continue;
            }
        }
        if state.changed().await.is_err() {
            break;
        }
    }
}

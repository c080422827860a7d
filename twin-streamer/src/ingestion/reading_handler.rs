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

//! Topic handler that validates sensor readings and persists them.

use crate::ingestion::validator::{ReadingValidator, ValidationError};
use crate::observability::{events, fields};
use crate::routing::{HandlerError, TopicHandler};
use crate::store::{ReadingStore, StoreError};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "reading_handler";

/// Failures while ingesting one message. The message is dropped in every case.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    Validation(ValidationError),
    Store(StoreError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Validation(err) => write!(f, "reading rejected: {err}"),
            IngestError::Store(err) => write!(f, "reading not persisted: {err}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IngestError::Validation(err) => Some(err),
            IngestError::Store(err) => Some(err),
        }
    }
}

/// Validates each payload and writes the reading to the reading store.
pub struct ReadingIngestHandler {
    validator: ReadingValidator,
    store: Arc<dyn ReadingStore>,
}

impl ReadingIngestHandler {
    pub fn new(validator: ReadingValidator, store: Arc<dyn ReadingStore>) -> Self {
        Self { validator, store }
    }

    /// Ingests one payload, returning the id assigned by the reading store.
    pub async fn ingest(&self, topic: &str, payload: &[u8]) -> Result<String, IngestError> {
        let reading = match self.validator.validate(payload) {
            Ok(reading) => reading,
            Err(err) => {
                warn!(
                    event = events::READING_REJECTED,
                    component = COMPONENT,
                    topic,
                    err = %err,
                    "dropping invalid sensor reading"
                );
                if tracing::enabled!(Level::DEBUG) {
                    debug!(
                        event = events::READING_REJECTED,
                        component = COMPONENT,
                        topic,
                        payload_preview = fields::format_payload_preview(payload).as_str(),
                        "rejected payload"
                    );
                }
                return Err(IngestError::Validation(err));
            }
        };

        match self.store.insert(&reading).await {
            Ok(reading_id) => {
                info!(
                    event = events::READING_PERSISTED,
                    component = COMPONENT,
                    topic,
                    reading_id = reading_id.as_str(),
                    water_system_id = reading.water_system_id.as_str(),
                    sensor_id = fields::format_optional(reading.sensor_id.as_deref()),
                    sensor = reading.sensor.as_str(),
                    value = reading.value,
                    measure_unit = %reading.measure_unit,
                    "processed sensor reading"
                );
                Ok(reading_id)
            }
            Err(err) => {
                warn!(
                    event = events::READING_PERSIST_FAILED,
                    component = COMPONENT,
                    topic,
                    water_system_id = reading.water_system_id.as_str(),
                    err = %err,
                    "unable to persist sensor reading"
                );
                Err(IngestError::Store(err))
            }
        }
    }
}

#[async_trait]
impl TopicHandler for ReadingIngestHandler {
    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<(), HandlerError> {
        self.ingest(topic, payload).await?;
        Ok(())
    }
}

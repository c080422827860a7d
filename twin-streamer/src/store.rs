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

//! Store gateway contracts for readings and twin records.
//!
//! The persistence driver lives outside this crate. Gateways own their own timeouts and
//! report failures as [`StoreError`]; callers never retry inline.

use crate::model::{MonitoredAsset, SensorReading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StoreError {
    /// The backing store could not be reached or timed out.
    Unavailable(String),
    NotFound(String),
    /// The store refused the document, e.g. an invariant violation.
    Rejected(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            StoreError::NotFound(id) => write!(f, "document '{id}' not found"),
            StoreError::Rejected(reason) => write!(f, "document rejected: {reason}"),
        }
    }
}

impl Error for StoreError {}

/// Reading query; every `None` field is unconstrained. Bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadingFilter {
    pub water_system_id: Option<String>,
    pub sensor_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ReadingFilter {
    pub fn for_water_system(water_system_id: &str) -> Self {
        Self {
            water_system_id: Some(water_system_id.to_string()),
            ..Default::default()
        }
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn accepts(&self, reading: &SensorReading) -> bool {
        if let Some(water_system_id) = &self.water_system_id {
            if &reading.water_system_id != water_system_id {
                return false;
            }
        }
        if let Some(sensor_id) = &self.sensor_id {
            if reading.sensor_id.as_ref() != Some(sensor_id) {
                return false;
            }
        }
        if let Some(start) = &self.start {
            if reading.create_date < *start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if reading.create_date > *end {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TwinFilter {
    pub status: Option<String>,
}

impl TwinFilter {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
        }
    }

    pub fn accepts(&self, asset: &MonitoredAsset) -> bool {
        self.status
            .as_ref()
            .map_or(true, |status| &asset.status == status)
    }
}

/// Append-only store of validated readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persists a reading and returns the id assigned by the store.
    async fn insert(&self, reading: &SensorReading) -> Result<String, StoreError>;

    /// Readings matching `filter`, in insertion order.
    async fn find(&self, filter: &ReadingFilter) -> Result<Vec<SensorReading>, StoreError>;

    async fn delete(&self, reading_id: &str) -> Result<bool, StoreError>;
}

/// Owner of the monitored-asset records.
#[async_trait]
pub trait TwinStore: Send + Sync {
    async fn list(&self, filter: &TwinFilter) -> Result<Vec<MonitoredAsset>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<MonitoredAsset>, StoreError>;

    /// Replaces the stored record in a single write and returns the modified count.
    async fn update(&self, id: &str, asset: &MonitoredAsset) -> Result<u64, StoreError>;

    async fn create(&self, asset: &MonitoredAsset) -> Result<String, StoreError>;

    async fn delete(&self, id: &str) -> Result<u64, StoreError>;
}

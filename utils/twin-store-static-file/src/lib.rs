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

//! # twin-store-static-file
//!
//! In-memory implementations of the `twin-streamer` store gateways. The twin store can be
//! seeded from a static JSON file holding an array of monitored assets; nothing is
//! written back to that file.

use async_trait::async_trait;
use std::fs::{self, canonicalize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use twin_streamer::model::{MonitoredAsset, SensorReading};
use twin_streamer::store::{ReadingFilter, ReadingStore, StoreError, TwinFilter, TwinStore};
use uuid::Uuid;

const COMPONENT: &str = "twin_store_static_file";

fn new_document_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Reading store kept in process memory, in insertion order.
#[derive(Default)]
pub struct InMemoryReadingStore {
    readings: RwLock<Vec<SensorReading>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.readings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.readings.read().await.is_empty()
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert(&self, reading: &SensorReading) -> Result<String, StoreError> {
        let id = new_document_id();
        let mut stored = reading.clone();
        stored.id = Some(id.clone());
        self.readings.write().await.push(stored);
        Ok(id)
    }

    async fn find(&self, filter: &ReadingFilter) -> Result<Vec<SensorReading>, StoreError> {
        Ok(self
            .readings
            .read()
            .await
            .iter()
            .filter(|reading| filter.accepts(reading))
            .cloned()
            .collect())
    }

    async fn delete(&self, reading_id: &str) -> Result<bool, StoreError> {
        let mut readings = self.readings.write().await;
        let before = readings.len();
        readings.retain(|reading| reading.id.as_deref() != Some(reading_id));
        Ok(readings.len() != before)
    }
}

/// Twin store held in memory, optionally seeded from a JSON file.
///
/// Every write is validated with [`MonitoredAsset::validate`]; invalid records are
/// rejected with [`StoreError::Rejected`].
#[derive(Default)]
pub struct TwinStoreStaticFile {
    assets: RwLock<Vec<MonitoredAsset>>,
}

impl TwinStoreStaticFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from in-memory records. Records without an id get a fresh one.
    pub fn from_assets(assets: Vec<MonitoredAsset>) -> Result<Self, StoreError> {
        let mut seeded: Vec<MonitoredAsset> = Vec::with_capacity(assets.len());

        for mut asset in assets {
            validate(&asset)?;
            let id = asset.id.get_or_insert_with(new_document_id).clone();
            if seeded.iter().any(|existing| existing.id.as_deref() == Some(id.as_str())) {
                return Err(StoreError::Rejected(format!("duplicate asset id '{id}'")));
            }
            seeded.push(asset);
        }

        Ok(Self {
            assets: RwLock::new(seeded),
        })
    }

    /// Seeds the store from a JSON array of assets.
    pub fn from_static_file(static_file: impl AsRef<Path>) -> Result<Self, StoreError> {
        let static_file = PathBuf::from(static_file.as_ref());
        debug!(
            component = COMPONENT,
            static_file = %static_file.display(),
            "loading static twin file"
        );

        let static_file = canonicalize(&static_file).map_err(|err| {
            StoreError::Unavailable(format!(
                "static twin file '{}' not found: {err}",
                static_file.display()
            ))
        })?;
        let data = fs::read_to_string(&static_file).map_err(|err| {
            StoreError::Unavailable(format!("unable to read static twin file: {err}"))
        })?;
        let assets: Vec<MonitoredAsset> = serde_json::from_str(&data).map_err(|err| {
            StoreError::Rejected(format!("unable to parse static twin file: {err}"))
        })?;

        let asset_count = assets.len();
        let store = Self::from_assets(assets)?;
        info!(
            component = COMPONENT,
            static_file = %static_file.display(),
            assets = asset_count,
            "static twin file loaded"
        );
        Ok(store)
    }
}

fn validate(asset: &MonitoredAsset) -> Result<(), StoreError> {
    asset.validate().map_err(|err| {
        warn!(
            component = COMPONENT,
            name = asset.name.as_str(),
            err = %err,
            "rejecting invalid asset"
        );
        StoreError::Rejected(err.to_string())
    })
}

#[async_trait]
impl TwinStore for TwinStoreStaticFile {
    async fn list(&self, filter: &TwinFilter) -> Result<Vec<MonitoredAsset>, StoreError> {
        Ok(self
            .assets
            .read()
            .await
            .iter()
            .filter(|asset| filter.accepts(asset))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<MonitoredAsset>, StoreError> {
        Ok(self
            .assets
            .read()
            .await
            .iter()
            .find(|asset| asset.id.as_deref() == Some(id))
            .cloned())
    }

    async fn update(&self, id: &str, asset: &MonitoredAsset) -> Result<u64, StoreError> {
        validate(asset)?;
        let mut assets = self.assets.write().await;

        match assets
            .iter_mut()
            .find(|stored| stored.id.as_deref() == Some(id))
        {
            Some(stored) => {
                *stored = MonitoredAsset {
                    id: Some(id.to_string()),
                    ..asset.clone()
                };
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn create(&self, asset: &MonitoredAsset) -> Result<String, StoreError> {
        validate(asset)?;
        let id = new_document_id();
        self.assets.write().await.push(MonitoredAsset {
            id: Some(id.clone()),
            ..asset.clone()
        });
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let mut assets = self.assets.write().await;
        let before = assets.len();
        assets.retain(|asset| asset.id.as_deref() != Some(id));
        Ok((before - assets.len()) as u64)
    }
}

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

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use twin_streamer::model::{MonitoredAsset, SensorReading};
use twin_streamer::store::{ReadingFilter, ReadingStore, StoreError, TwinFilter, TwinStore};

/// Reading store whose every call fails as if the backing database were down.
#[derive(Default)]
pub struct UnavailableReadingStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("scripted outage".to_string())
}

#[async_trait]
impl ReadingStore for UnavailableReadingStore {
    async fn insert(&self, _reading: &SensorReading) -> Result<String, StoreError> {
        Err(unavailable())
    }

    async fn find(&self, _filter: &ReadingFilter) -> Result<Vec<SensorReading>, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _reading_id: &str) -> Result<bool, StoreError> {
        Err(unavailable())
    }
}

/// Wraps a twin store and fails selected calls.
pub struct FaultInjectingTwinStore {
    inner: Arc<dyn TwinStore>,
    failing_updates: Mutex<HashSet<String>>,
    failing_list: Mutex<bool>,
    update_calls: Mutex<Vec<String>>,
}

impl FaultInjectingTwinStore {
    pub fn new(inner: Arc<dyn TwinStore>) -> Self {
        Self {
            inner,
            failing_updates: Mutex::new(HashSet::new()),
            failing_list: Mutex::new(false),
            update_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_updates_for(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_string());
    }

    pub fn set_list_failing(&self, failing: bool) {
        *self.failing_list.lock().unwrap() = failing;
    }

    /// Ids passed to `update`, in call order, including failed calls.
    pub fn update_calls(&self) -> Vec<String> {
        self.update_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TwinStore for FaultInjectingTwinStore {
    async fn list(&self, filter: &TwinFilter) -> Result<Vec<MonitoredAsset>, StoreError> {
        if *self.failing_list.lock().unwrap() {
            return Err(unavailable());
        }
        self.inner.list(filter).await
    }

    async fn get(&self, id: &str) -> Result<Option<MonitoredAsset>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &str, asset: &MonitoredAsset) -> Result<u64, StoreError> {
        self.update_calls.lock().unwrap().push(id.to_string());
        if self.failing_updates.lock().unwrap().contains(id) {
            return Err(unavailable());
        }
        self.inner.update(id, asset).await
    }

    async fn create(&self, asset: &MonitoredAsset) -> Result<String, StoreError> {
        self.inner.create(asset).await
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        self.inner.delete(id).await
    }
}

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

//! One aggregation pass over every online asset.

use crate::aggregation::aggregator::{aggregate_at, AggregationError};
use crate::model::{MonitoredAsset, STATUS_ONLINE};
use crate::observability::{events, fields};
use crate::store::{ReadingFilter, ReadingStore, StoreError, TwinFilter, TwinStore};
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const COMPONENT: &str = "aggregation_cycle";

#[derive(Debug)]
pub enum AssetCycleError {
    Aggregation(AggregationError),
    Store(StoreError),
    /// The twin store listed an asset without an id.
    MissingId,
    Panicked(String),
}

impl Display for AssetCycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetCycleError::Aggregation(err) => write!(f, "{err}"),
            AssetCycleError::Store(err) => write!(f, "store failure: {err}"),
            AssetCycleError::MissingId => write!(f, "listed asset has no id"),
            AssetCycleError::Panicked(reason) => write!(f, "asset cycle panicked: {reason}"),
        }
    }
}

impl Error for AssetCycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AssetCycleError::Aggregation(err) => Some(err),
            AssetCycleError::Store(err) => Some(err),
            AssetCycleError::MissingId | AssetCycleError::Panicked(_) => None,
        }
    }
}

impl From<AggregationError> for AssetCycleError {
    fn from(err: AggregationError) -> Self {
        AssetCycleError::Aggregation(err)
    }
}

impl From<StoreError> for AssetCycleError {
    fn from(err: StoreError) -> Self {
        AssetCycleError::Store(err)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AssetOutcome {
    Updated,
    /// Empty window; nothing was written.
    Unchanged,
    /// The asset's previous cycle had not finished.
    SkippedInFlight,
    /// The asset was deleted or went offline after it was listed.
    Vanished,
}

#[derive(Debug)]
pub struct AssetFailure {
    pub water_system_id: String,
    pub error: AssetCycleError,
}

#[derive(Debug)]
pub struct AggregationCycleReport {
    pub started_at: DateTime<Utc>,
    pub assets_seen: usize,
    pub assets_updated: usize,
    pub assets_unchanged: usize,
    pub assets_skipped_in_flight: usize,
    pub assets_vanished: usize,
    pub failures: Vec<AssetFailure>,
}

impl AggregationCycleReport {
    fn new(started_at: DateTime<Utc>, assets_seen: usize) -> Self {
        Self {
            started_at,
            assets_seen,
            assets_updated: 0,
            assets_unchanged: 0,
            assets_skipped_in_flight: 0,
            assets_vanished: 0,
            failures: Vec::new(),
        }
    }

    fn record(
        &mut self,
        water_system_id: String,
        outcome: Result<AssetOutcome, AssetCycleError>,
    ) {
        match outcome {
            Ok(AssetOutcome::Updated) => self.assets_updated += 1,
            Ok(AssetOutcome::Unchanged) => self.assets_unchanged += 1,
            Ok(AssetOutcome::SkippedInFlight) => self.assets_skipped_in_flight += 1,
            Ok(AssetOutcome::Vanished) => self.assets_vanished += 1,
            Err(error) => self.failures.push(AssetFailure {
                water_system_id,
                error,
            }),
        }
    }
}

/// Fetch, aggregate and persist for every online asset.
///
/// Assets are processed concurrently and independently. An asset whose previous cycle is
/// still running is skipped, so merges for one twin never overlap.
pub struct AggregationCycle {
    readings: Arc<dyn ReadingStore>,
    twins: Arc<dyn TwinStore>,
    in_flight: Mutex<HashSet<String>>,
}

/// Releases an asset's in-flight claim when its work ends, including by panic.
struct InFlightClaim {
    cycle: Arc<AggregationCycle>,
    water_system_id: String,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.cycle
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.water_system_id);
    }
}

impl AggregationCycle {
    pub fn new(readings: Arc<dyn ReadingStore>, twins: Arc<dyn TwinStore>) -> Self {
        Self {
            readings,
            twins,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub async fn run(self: &Arc<Self>) -> Result<AggregationCycleReport, StoreError> {
        self.run_at(Utc::now()).await
    }

    /// Runs one pass using `now` as the window end and the "last updated" stamp.
    ///
    /// Fails only when the asset list itself cannot be read; per-asset failures are
    /// collected in the report.
    pub async fn run_at(
        self: &Arc<Self>,
        now: DateTime<Utc>,
    ) -> Result<AggregationCycleReport, StoreError> {
        let assets = match self.twins.list(&TwinFilter::with_status(STATUS_ONLINE)).await {
            Ok(assets) => assets,
            Err(err) => {
                warn!(
                    event = events::AGGREGATION_LIST_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "unable to list online assets; skipping cycle"
                );
                return Err(err);
            }
        };

        info!(
            event = events::AGGREGATION_CYCLE_START,
            component = COMPONENT,
            assets = assets.len(),
            now = fields::format_timestamp(&now),
            "aggregation cycle started"
        );

        let mut report = AggregationCycleReport::new(now, assets.len());
        let mut running = JoinSet::new();

        for asset in assets {
            let Some(water_system_id) = asset.id.clone() else {
                warn!(
                    event = events::ASSET_CYCLE_FAILED,
                    component = COMPONENT,
                    water_system_id = fields::NONE,
                    name = asset.name.as_str(),
                    "listed asset has no id"
                );
                report.record(asset.name, Err(AssetCycleError::MissingId));
                continue;
            };

            let Some(claim) = self.try_claim(&water_system_id) else {
                info!(
                    event = events::ASSET_SKIPPED_IN_FLIGHT,
                    component = COMPONENT,
                    water_system_id = water_system_id.as_str(),
                    "previous cycle still running; skipping asset"
                );
                report.record(water_system_id, Ok(AssetOutcome::SkippedInFlight));
                continue;
            };

            let cycle = Arc::clone(self);
            running.spawn(async move {
                let outcome = AssertUnwindSafe(cycle.process_asset(&water_system_id, now))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(AssetCycleError::Panicked(panic_message(panic.as_ref())))
                    });
                drop(claim);
                (water_system_id, outcome)
            });
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((water_system_id, outcome)) => {
                    if let Err(err) = &outcome {
                        warn!(
                            event = events::ASSET_CYCLE_FAILED,
                            component = COMPONENT,
                            water_system_id = water_system_id.as_str(),
                            err = %err,
                            "asset cycle failed"
                        );
                    }
                    report.record(water_system_id, outcome);
                }
                Err(err) => {
                    warn!(
                        event = events::ASSET_CYCLE_FAILED,
                        component = COMPONENT,
                        water_system_id = fields::NONE,
                        err = %err,
                        "asset task ended abnormally"
                    );
                }
            }
        }

        info!(
            event = events::AGGREGATION_CYCLE_FINISH,
            component = COMPONENT,
            assets = report.assets_seen,
            updated = report.assets_updated,
            unchanged = report.assets_unchanged,
            skipped_in_flight = report.assets_skipped_in_flight,
            vanished = report.assets_vanished,
            failed = report.failures.len(),
            "aggregation cycle finished"
        );
        Ok(report)
    }

    /// Read-modify-write for one asset. The twin is re-read so edits made since the
    /// listing are kept, and the merged snapshot is persisted in one `update`.
    pub async fn process_asset(
        &self,
        water_system_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AssetOutcome, AssetCycleError> {
        let Some(asset) = self.twins.get(water_system_id).await? else {
            return Ok(self.vanished(water_system_id, "asset no longer exists"));
        };
        if !asset.is_online() {
            return Ok(self.vanished(water_system_id, "asset went offline"));
        }

        let filter = ReadingFilter::for_water_system(water_system_id)
            .between(window_start(&asset, now), now);
        let readings = self.readings.find(&filter).await?;
        let updated = aggregate_at(&asset, &readings, now)?;

        if readings.is_empty() {
            return Ok(AssetOutcome::Unchanged);
        }

        let modified = self.twins.update(water_system_id, &updated).await?;
        if modified == 0 {
            return Ok(self.vanished(water_system_id, "update modified no record"));
        }

        debug!(
            event = events::ASSET_UPDATED,
            component = COMPONENT,
            water_system_id,
            readings = readings.len(),
            "twin statistics updated"
        );
        Ok(AssetOutcome::Updated)
    }

    fn try_claim(self: &Arc<Self>, water_system_id: &str) -> Option<InFlightClaim> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(water_system_id.to_string());

        inserted.then(|| InFlightClaim {
            cycle: Arc::clone(self),
            water_system_id: water_system_id.to_string(),
        })
    }

    fn vanished(&self, water_system_id: &str, reason: &str) -> AssetOutcome {
        info!(
            event = events::ASSET_VANISHED,
            component = COMPONENT,
            water_system_id,
            reason,
            "skipping asset"
        );
        AssetOutcome::Vanished
    }
}

fn window_start(asset: &MonitoredAsset, now: DateTime<Utc>) -> DateTime<Utc> {
    TimeDelta::from_std(asset.twinning_window())
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

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

//! Fixed-period driver for [`AggregationCycle`].

use crate::aggregation::cycle::{AggregationCycle, AggregationCycleReport};
use crate::observability::events;
use crate::runtime::task_runtime::{spawn_on_current_runtime, RuntimeUnavailable};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const COMPONENT: &str = "aggregation_scheduler";
const SCHEDULER_TASK_LABEL: &str = "twin-aggregation-scheduler";

#[derive(Debug)]
pub enum SchedulerError {
    ZeroPeriod,
    RuntimeUnavailable(RuntimeUnavailable),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::ZeroPeriod => write!(f, "aggregation period must be non-zero"),
            SchedulerError::RuntimeUnavailable(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SchedulerError::RuntimeUnavailable(err) => Some(err),
            SchedulerError::ZeroPeriod => None,
        }
    }
}

/// Fires an aggregation cycle every `period`, independent of message arrival.
///
/// The first cycle runs one period after `start`. A tick never waits for the previous
/// cycle: cycles run as separate tasks and the cycle itself skips assets still in flight.
/// Ticks missed because the runtime was busy are skipped, not replayed.
pub struct AggregationScheduler {
    cycle: Arc<AggregationCycle>,
    period: Duration,
}

impl AggregationScheduler {
    pub fn new(cycle: Arc<AggregationCycle>, period: Duration) -> Result<Self, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        Ok(Self { cycle, period })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawns the timer loop on the current tokio runtime.
    pub fn start(self) -> Result<SchedulerHandle, SchedulerError> {
        let (stop_sender, stop_receiver) = oneshot::channel();
        let period = self.period;
        let task = spawn_on_current_runtime(SCHEDULER_TASK_LABEL, self.run(stop_receiver))
            .map_err(SchedulerError::RuntimeUnavailable)?;

        info!(
            event = events::SCHEDULER_START,
            component = COMPONENT,
            period_ms = period.as_millis() as u64,
            "aggregation scheduler started"
        );

        Ok(SchedulerHandle {
            stop_sender: Some(stop_sender),
            task,
        })
    }

    async fn run(self, mut stop_receiver: oneshot::Receiver<()>) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = JoinSet::new();
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_receiver => break,
                _ = ticker.tick() => {
                    ticks += 1;
                    debug!(
                        event = events::SCHEDULER_TICK,
                        component = COMPONENT,
                        tick = ticks,
                        cycles_running = cycles.len(),
                        "aggregation tick"
                    );
                    let cycle = self.cycle.clone();
                    cycles.spawn(async move { cycle.run().await });
                }
                Some(finished) = cycles.join_next(), if !cycles.is_empty() => {
                    log_cycle_result(finished);
                }
            }
        }

        while let Some(finished) = cycles.join_next().await {
            log_cycle_result(finished);
        }

        info!(
            event = events::SCHEDULER_STOP,
            component = COMPONENT,
            ticks,
            "aggregation scheduler stopped"
        );
        ticks
    }
}

fn log_cycle_result(finished: Result<Result<AggregationCycleReport, StoreError>, JoinError>) {
    // Listing failures are logged by the cycle and retried on the next tick.
    if let Err(err) = finished {
        warn!(
            event = events::SCHEDULER_CYCLE_ABORTED,
            component = COMPONENT,
            err = %err,
            "aggregation cycle task ended abnormally"
        );
    }
}

/// Handle to a running scheduler. Dropping it also stops the scheduler, without waiting.
pub struct SchedulerHandle {
    stop_sender: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Stops ticking and waits for running cycles to finish. Returns the number of ticks.
    pub async fn stop(mut self) -> u64 {
        if let Some(stop_sender) = self.stop_sender.take() {
            let _ = stop_sender.send(());
        }

        match (&mut self.task).await {
            Ok(ticks) => ticks,
            Err(err) => {
                warn!(
                    event = events::SCHEDULER_CYCLE_ABORTED,
                    component = COMPONENT,
                    err = %err,
                    "scheduler task ended abnormally"
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AggregationScheduler, SchedulerError};
    use crate::aggregation::AggregationCycle;
    use crate::model::{MonitoredAsset, SensorReading};
    use crate::store::{ReadingFilter, ReadingStore, StoreError, TwinFilter, TwinStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct NoReadings;

    #[async_trait]
    impl ReadingStore for NoReadings {
        async fn insert(&self, _reading: &SensorReading) -> Result<String, StoreError> {
            Ok(String::new())
        }

        async fn find(&self, _filter: &ReadingFilter) -> Result<Vec<SensorReading>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _reading_id: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct CountingTwins {
        lists: AtomicUsize,
    }

    #[async_trait]
    impl TwinStore for CountingTwins {
        async fn list(&self, _filter: &TwinFilter) -> Result<Vec<MonitoredAsset>, StoreError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn get(&self, _id: &str) -> Result<Option<MonitoredAsset>, StoreError> {
            Ok(None)
        }

        async fn update(&self, _id: &str, _asset: &MonitoredAsset) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn create(&self, _asset: &MonitoredAsset) -> Result<String, StoreError> {
            Ok(String::new())
        }

        async fn delete(&self, _id: &str) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn zero_period_is_rejected() {
        let cycle = Arc::new(AggregationCycle::new(
            Arc::new(NoReadings),
            Arc::new(CountingTwins::default()),
        ));

        assert!(matches!(
            AggregationScheduler::new(cycle, Duration::ZERO),
            Err(SchedulerError::ZeroPeriod)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period_until_stopped() {
        let twins = Arc::new(CountingTwins::default());
        let cycle = Arc::new(AggregationCycle::new(Arc::new(NoReadings), twins.clone()));
        let handle = AggregationScheduler::new(cycle, Duration::from_secs(60))
            .unwrap()
            .start()
            .unwrap();

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(twins.lists.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(150)).await;
        let ticks = handle.stop().await;

        assert_eq!(ticks, 3);
        assert_eq!(twins.lists.load(Ordering::SeqCst), 3);
    }
}

//! Aggregation layer.
//!
//! `aggregator` is the pure fold from a window of readings to twin statistics. `cycle`
//! performs the per-asset read-modify-write against the store gateways, and `scheduler`
//! drives cycles on a fixed period.

pub(crate) mod aggregator;
pub(crate) mod cycle;
pub(crate) mod scheduler;

pub use aggregator::{aggregate, aggregate_at, AggregationError};
pub use cycle::{
    AggregationCycle, AggregationCycleReport, AssetCycleError, AssetFailure, AssetOutcome,
};
pub use scheduler::{AggregationScheduler, SchedulerError, SchedulerHandle};

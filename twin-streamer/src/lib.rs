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

//! # twin-streamer
//!
//! `twin-streamer` ingests sensor telemetry pushed over a publish/subscribe transport,
//! validates and persists each reading, and periodically folds a sliding window of
//! readings into per-sensor statistics on each monitored asset's digital twin.
//!
//! Two independent schedules drive the crate: the push-driven ingestion path behind
//! [`IngestionDispatcher`], and the fixed-period [`aggregation::AggregationScheduler`].
//!
//! ## Ingestion
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use async_trait::async_trait;
//! use twin_streamer::routing::{HandlerError, TopicHandler};
//! use twin_streamer::transport::{DeliveryListener, TelemetryTransport, TransportError};
//! use twin_streamer::IngestionDispatcher;
//!
//! # #[derive(Default)]
//! # struct MockTransport {
//! #     listener: Mutex<Option<Arc<dyn DeliveryListener>>>,
//! # }
//! #
//! # #[async_trait]
//! # impl TelemetryTransport for MockTransport {
//! #     async fn connect(&self, listener: Arc<dyn DeliveryListener>) -> Result<(), TransportError> {
//! #         *self.listener.lock().unwrap() = Some(listener);
//! #         Ok(())
//! #     }
//! #     async fn subscribe(&self, _pattern: &str) -> Result<(), TransportError> { Ok(()) }
//! #     async fn disconnect(&self) -> Result<(), TransportError> { Ok(()) }
//! # }
//! #
//! struct PrintTopic;
//!
//! #[async_trait]
//! impl TopicHandler for PrintTopic {
//!     async fn handle(&self, topic: &str, _payload: &[u8]) -> Result<(), HandlerError> {
//!         println!("reading on {topic}");
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = Arc::new(MockTransport::default());
//! let dispatcher = IngestionDispatcher::new("quick-start", transport.clone(), 16);
//!
//! dispatcher.register("plant/+", Arc::new(PrintTopic)).await.unwrap();
//! dispatcher.connect().await.unwrap();
//! dispatcher.start().await.unwrap();
//!
//! // The transport calls the listener from its own network thread.
//! let listener = transport.listener.lock().unwrap().clone().unwrap();
//! std::thread::spawn(move || listener.on_message("plant/S1", b"{}"))
//!     .join()
//!     .unwrap();
//!
//! let report = dispatcher.stop().await.unwrap();
//! assert_eq!(report.handled, 1);
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`IngestionDispatcher`] owning the transport connection
//! - Routing: topic-pattern matching and the ordered handler registry
//! - Data plane: non-blocking delivery listener and the in-order dispatch loop
//! - Ingestion: reading validation and the persisting topic handler
//! - Aggregation: window fold, per-asset cycle and fixed-period scheduler
//! - Store / transport: gateway traits implemented outside this crate
//! - Runtime: where background loops are spawned
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. Binaries and
//! tests are responsible for one-time `tracing_subscriber` initialization.

pub mod aggregation;
mod data_plane;
mod dispatcher;
pub use dispatcher::{
    DispatchStopReport, DispatcherError, IngestionDispatcher, DEFAULT_MESSAGE_QUEUE_SIZE,
};

pub mod ingestion;
pub mod model;
#[doc(hidden)]
pub mod observability;
pub mod routing;
mod runtime;
pub use runtime::task_runtime::RuntimeUnavailable;
pub mod store;
pub mod transport;

#[doc(hidden)]
pub mod benchmark_support;

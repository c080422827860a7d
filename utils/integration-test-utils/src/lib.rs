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

//! Shared helpers for `twin-streamer` integration tests and benchmarks.

mod fixtures;
pub use fixtures::{asset_with_sensors, wait_until, ReadingPayload};
mod scripted_transport;
pub use scripted_transport::ScriptedTransport;
mod test_handlers;
pub use test_handlers::{CollectingHandler, HandlerScript};
mod test_stores;
pub use test_stores::{FaultInjectingTwinStore, UnavailableReadingStore};

/// Installs a test-writer `tracing` subscriber once per test binary.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

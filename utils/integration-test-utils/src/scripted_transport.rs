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
use std::sync::{Arc, Mutex};
use tracing::debug;
use twin_streamer::transport::{DeliveryListener, TelemetryTransport, TransportError};

/// Transport double that invokes the listener from its own `std::thread`, the way a real
/// client library's network thread would.
#[derive(Default)]
pub struct ScriptedTransport {
    listener: Mutex<Option<Arc<dyn DeliveryListener>>>,
    subscriptions: Mutex<Vec<String>>,
    connects: Mutex<u32>,
    disconnects: Mutex<u32>,
    refuse_connect: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `connect` always fails with `ConnectionLost`.
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Default::default()
        }
    }

    fn current_listener(&self) -> Arc<dyn DeliveryListener> {
        self.listener
            .lock()
            .unwrap()
            .clone()
            .expect("transport must be connected before delivering")
    }

    /// Delivers `messages` in order from a freshly spawned network thread and waits for
    /// the thread to finish.
    pub fn deliver_from_network_thread(&self, messages: Vec<(String, Vec<u8>)>) {
        let listener = self.current_listener();
        std::thread::Builder::new()
            .name("scripted-network".to_string())
            .spawn(move || {
                for (topic, payload) in messages {
                    listener.on_message(&topic, &payload);
                }
            })
            .expect("spawn scripted network thread")
            .join()
            .expect("scripted network thread panicked");
    }

    pub fn simulate_connection_lost(&self, reason: &str) {
        let listener = self.current_listener();
        let reason = reason.to_string();
        std::thread::spawn(move || listener.on_connection_lost(&reason))
            .join()
            .expect("scripted network thread panicked");
    }

    pub fn simulate_reconnect(&self) {
        let listener = self.current_listener();
        std::thread::spawn(move || listener.on_reconnected())
            .join()
            .expect("scripted network thread panicked");
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn connects(&self) -> u32 {
        *self.connects.lock().unwrap()
    }

    pub fn disconnects(&self) -> u32 {
        *self.disconnects.lock().unwrap()
    }
}

#[async_trait]
impl TelemetryTransport for ScriptedTransport {
    async fn connect(&self, listener: Arc<dyn DeliveryListener>) -> Result<(), TransportError> {
        *self.connects.lock().unwrap() += 1;
        if self.refuse_connect {
            return Err(TransportError::ConnectionLost(
                "scripted broker refused the connection".to_string(),
            ));
        }
        *self.listener.lock().unwrap() = Some(listener);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), TransportError> {
        debug!(pattern, "scripted subscribe");
        self.subscriptions.lock().unwrap().push(pattern.to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        *self.disconnects.lock().unwrap() += 1;
        self.listener.lock().unwrap().take();
        Ok(())
    }
}

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

//! # twin-streamer-mqtt
//!
//! MQTT implementation of [`TelemetryTransport`] on top of `rumqttc`.
//!
//! The `rumqttc` event loop runs on a dedicated network thread. Publishes are handed to
//! the [`DeliveryListener`] from that thread in broker order. The transport never
//! reconnects on its own: a connection error is reported through
//! [`DeliveryListener::on_connection_lost`] and the thread ends, leaving the retry policy
//! to the caller.

use async_trait::async_trait;
use rumqttc::{Client, ClientError, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use twin_streamer::transport::{DeliveryListener, TelemetryTransport, TransportError};

const COMPONENT: &str = "mqtt_transport";
const NETWORK_THREAD_NAME: &str = "twin-mqtt-network";

mod events {
    pub const MQTT_CONNECT_START: &str = "mqtt_connect_start";
    pub const MQTT_CONNECT_OK: &str = "mqtt_connect_ok";
    pub const MQTT_CONNECT_FAILED: &str = "mqtt_connect_failed";
    pub const MQTT_SUBSCRIBE_REQUESTED: &str = "mqtt_subscribe_requested";
    pub const MQTT_CONNECTION_ERROR: &str = "mqtt_connection_error";
    pub const MQTT_DISCONNECT: &str = "mqtt_disconnect";
    pub const MQTT_NETWORK_THREAD_EXIT: &str = "mqtt_network_thread_exit";
}

pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_CAPACITY: usize = 64;

/// Broker endpoint and session settings.
#[derive(Clone, Debug, PartialEq)]
pub struct MqttTransportOptions {
    pub hostname: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
    /// Capacity of the request channel between client handle and event loop.
    pub request_capacity: usize,
    pub subscribe_qos: QoS,
}

impl MqttTransportOptions {
    pub fn new(hostname: &str, port: u16, client_id: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            port,
            client_id: client_id.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
            subscribe_qos: QoS::AtLeastOnce,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.hostname, self.port);
        // Keep-alives shorter than five seconds are raised to that floor.
        options.set_keep_alive(self.keep_alive.max(Duration::from_secs(5)));
        options.set_clean_session(true);
        options
    }
}

struct MqttSession {
    client: Client,
    closing: Arc<AtomicBool>,
}

/// [`TelemetryTransport`] backed by one MQTT client session at a time.
///
/// Calling `connect` again replaces the previous session.
pub struct MqttTelemetryTransport {
    options: MqttTransportOptions,
    session: Mutex<Option<MqttSession>>,
}

impl MqttTelemetryTransport {
    pub fn new(options: MqttTransportOptions) -> Self {
        Self {
            options,
            session: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &MqttTransportOptions {
        &self.options
    }

    fn broker(&self) -> String {
        format!("{}:{}", self.options.hostname, self.options.port)
    }

    fn take_session(&self) -> Option<MqttSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn close_session(session: MqttSession) -> Result<(), ClientError> {
        session.closing.store(true, Ordering::Release);
        session.client.try_disconnect()
    }
}

/// Drives the `rumqttc` event loop until the connection fails or the session is closed.
fn run_network_loop(
    mut connection: rumqttc::Connection,
    listener: Arc<dyn DeliveryListener>,
    closing: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<(), TransportError>>,
) {
    let mut ready = Some(ready);

    for notification in connection.iter() {
        if closing.load(Ordering::Acquire) {
            break;
        }

        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Ok(()));
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                listener.on_message(&publish.topic, &publish.payload[..]);
            }
            Ok(_) => {}
            Err(err) => {
                let reason = err.to_string();
                match ready.take() {
                    Some(ready) => {
                        let _ = ready.send(Err(TransportError::ConnectionLost(reason)));
                    }
                    None => {
                        warn!(
                            event = events::MQTT_CONNECTION_ERROR,
                            component = COMPONENT,
                            reason = reason.as_str(),
                            "mqtt connection failed"
                        );
                        listener.on_connection_lost(&reason);
                    }
                }
                break;
            }
        }
    }

    debug!(
        event = events::MQTT_NETWORK_THREAD_EXIT,
        component = COMPONENT,
        "mqtt network thread exiting"
    );
}

#[async_trait]
impl TelemetryTransport for MqttTelemetryTransport {
    async fn connect(&self, listener: Arc<dyn DeliveryListener>) -> Result<(), TransportError> {
        if let Some(previous) = self.take_session() {
            let _ = Self::close_session(previous);
        }

        let broker = self.broker();
        info!(
            event = events::MQTT_CONNECT_START,
            component = COMPONENT,
            broker = broker.as_str(),
            client_id = self.options.client_id.as_str(),
            "connecting to mqtt broker"
        );

        let (client, connection) =
            Client::new(self.options.mqtt_options(), self.options.request_capacity);
        let closing = Arc::new(AtomicBool::new(false));
        let (ready_sender, ready_receiver) = oneshot::channel();

        let thread_closing = closing.clone();
        std::thread::Builder::new()
            .name(NETWORK_THREAD_NAME.to_string())
            .spawn(move || run_network_loop(connection, listener, thread_closing, ready_sender))
            .map_err(|err| TransportError::Internal(format!("network thread: {err}")))?;

        let session = MqttSession { client, closing };
        let outcome = match tokio::time::timeout(self.options.connect_timeout, ready_receiver).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::ConnectionLost(
                "network thread ended before the broker answered".to_string(),
            )),
            Err(_) => Err(TransportError::ConnectionLost(format!(
                "no CONNACK within {:?}",
                self.options.connect_timeout
            ))),
        };

        match outcome {
            Ok(()) => {
                info!(
                    event = events::MQTT_CONNECT_OK,
                    component = COMPONENT,
                    broker = broker.as_str(),
                    "connected to mqtt broker"
                );
                *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::MQTT_CONNECT_FAILED,
                    component = COMPONENT,
                    broker = broker.as_str(),
                    err = %err,
                    "mqtt connect failed"
                );
                let _ = Self::close_session(session);
                Err(err)
            }
        }
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), TransportError> {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let session = session.as_ref().ok_or(TransportError::NotConnected)?;

        session
            .client
            .try_subscribe(pattern, self.options.subscribe_qos)
            .map_err(|err| TransportError::SubscribeFailed {
                pattern: pattern.to_string(),
                reason: err.to_string(),
            })?;

        debug!(
            event = events::MQTT_SUBSCRIBE_REQUESTED,
            component = COMPONENT,
            pattern,
            "subscribe request queued"
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(session) = self.take_session() else {
            return Ok(());
        };

        info!(
            event = events::MQTT_DISCONNECT,
            component = COMPONENT,
            broker = self.broker().as_str(),
            "disconnecting from mqtt broker"
        );
        Self::close_session(session).map_err(|err| TransportError::Internal(err.to_string()))
    }
}

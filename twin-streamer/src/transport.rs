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

//! Transport seam between the dispatcher and a publish/subscribe client.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Callbacks a transport invokes from its own network thread.
///
/// Implementations must return promptly and never block: the caller is the thread that
/// services the broker connection.
pub trait DeliveryListener: Send + Sync {
    fn on_message(&self, topic: &str, payload: &[u8]);

    /// The session was re-established after the initial connect; subscriptions may have
    /// been lost with the previous session.
    fn on_reconnected(&self);

    fn on_connection_lost(&self, reason: &str);
}

/// A publish/subscribe client owning one broker connection.
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// Opens the connection and starts delivering messages to `listener`.
    async fn connect(&self, listener: Arc<dyn DeliveryListener>) -> Result<(), TransportError>;

    async fn subscribe(&self, pattern: &str) -> Result<(), TransportError>;

    /// Closes the connection. No listener callbacks are made once this returns.
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TransportError {
    ConnectionLost(String),
    NotConnected,
    SubscribeFailed { pattern: String, reason: String },
    Internal(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectionLost(reason) => write!(f, "connection lost: {reason}"),
            TransportError::NotConnected => write!(f, "transport is not connected"),
            TransportError::SubscribeFailed { pattern, reason } => {
                write!(f, "failed to subscribe to '{pattern}': {reason}")
            }
            TransportError::Internal(reason) => write!(f, "transport failure: {reason}"),
        }
    }
}

impl Error for TransportError {}

/// Connection status published to the owner of a dispatcher, which decides whether and
/// when to reconnect.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Lost(String),
}

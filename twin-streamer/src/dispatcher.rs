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

//! Public facade for the ingestion side: owns the transport connection, the
//! pattern -> handler registry and the dispatch loop.

use crate::data_plane::delivery_listener::QueueingDeliveryListener;
use crate::data_plane::dispatch_worker::{
    subscribe_patterns, Delivery, DispatchSummary, DispatchWorker,
};
use crate::observability::events;
use crate::routing::handler_registry::{HandlerRegistry, Registration};
use crate::routing::{TopicHandler, TopicPattern, TopicPatternError};
use crate::runtime::task_runtime::{spawn_on_current_runtime, RuntimeUnavailable};
use crate::transport::{ConnectionState, DeliveryListener, TelemetryTransport, TransportError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMPONENT: &str = "dispatcher";
const DISPATCH_LOOP_TASK_LABEL: &str = "twin-dispatch-loop";

/// Default capacity of the queue between the network thread and the dispatch loop.
pub const DEFAULT_MESSAGE_QUEUE_SIZE: usize = 1024;

#[derive(Debug)]
pub enum DispatcherError {
    InvalidPattern(TopicPatternError),
    AlreadyStarted,
    NotStarted,
    RuntimeUnavailable(RuntimeUnavailable),
    Transport(TransportError),
}

impl Display for DispatcherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatcherError::InvalidPattern(err) => write!(f, "invalid topic pattern: {err}"),
            DispatcherError::AlreadyStarted => write!(f, "dispatch loop was already started"),
            DispatcherError::NotStarted => write!(f, "dispatch loop is not running"),
            DispatcherError::RuntimeUnavailable(err) => write!(f, "{err}"),
            DispatcherError::Transport(err) => write!(f, "transport failure: {err}"),
        }
    }
}

impl Error for DispatcherError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatcherError::InvalidPattern(err) => Some(err),
            DispatcherError::RuntimeUnavailable(err) => Some(err),
            DispatcherError::Transport(err) => Some(err),
            DispatcherError::AlreadyStarted | DispatcherError::NotStarted => None,
        }
    }
}

impl From<TransportError> for DispatcherError {
    fn from(err: TransportError) -> Self {
        DispatcherError::Transport(err)
    }
}

/// Counts reported by [`IngestionDispatcher::stop`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct DispatchStopReport {
    pub handled: u64,
    pub failed: u64,
    pub unmatched: u64,
}

impl DispatchStopReport {
    fn from_summary(summary: DispatchSummary) -> Self {
        Self {
            handled: summary.handled,
            failed: summary.failed,
            unmatched: summary.unmatched,
        }
    }
}

#[derive(Default)]
enum LoopState {
    Idle(mpsc::Receiver<Delivery>),
    Running(JoinHandle<DispatchSummary>),
    #[default]
    Stopped,
}

/// Bridges a push-driven transport onto the tokio runtime.
///
/// The transport's network thread only enqueues onto a bounded queue; a single dispatch
/// loop on the runtime drains it in order and runs the first handler whose pattern
/// matches. Handler failures and panics are logged per message and never stop the loop.
///
/// Lifecycle: `register` handlers, `connect`, `start`, and eventually `stop`. Messages
/// arriving between `connect` and `start` wait in the queue.
pub struct IngestionDispatcher {
    name: String,
    transport: Arc<dyn TelemetryTransport>,
    registry: Arc<HandlerRegistry>,
    sender: mpsc::Sender<Delivery>,
    accepting: Arc<AtomicBool>,
    connection_state: Arc<watch::Sender<ConnectionState>>,
    loop_state: Mutex<LoopState>,
}

impl IngestionDispatcher {
    pub fn new(
        name: &str,
        transport: Arc<dyn TelemetryTransport>,
        message_queue_size: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(message_queue_size.max(1));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        debug!(
            event = events::DISPATCHER_CREATED,
            component = COMPONENT,
            dispatcher = name,
            message_queue_size,
            "dispatcher created"
        );

        Self {
            name: name.to_string(),
            transport,
            registry: Arc::new(HandlerRegistry::new()),
            sender,
            accepting: Arc::new(AtomicBool::new(true)),
            connection_state: Arc::new(connection_state),
            loop_state: Mutex::new(LoopState::Idle(receiver)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `handler` to `pattern`. Patterns are evaluated in registration order and the
    /// first match wins; re-registering a pattern replaces its handler in place.
    ///
    /// When the transport is already connected the pattern is subscribed immediately.
    pub async fn register(
        &self,
        pattern: &str,
        handler: Arc<dyn TopicHandler>,
    ) -> Result<(), DispatcherError> {
        let pattern = TopicPattern::parse(pattern).map_err(DispatcherError::InvalidPattern)?;

        match self.registry.register(pattern.clone(), handler) {
            Registration::Added => info!(
                event = events::DISPATCHER_REGISTER,
                component = COMPONENT,
                dispatcher = self.name.as_str(),
                pattern = pattern.as_str(),
                "handler registered"
            ),
            Registration::Replaced => info!(
                event = events::DISPATCHER_REGISTER_REPLACED,
                component = COMPONENT,
                dispatcher = self.name.as_str(),
                pattern = pattern.as_str(),
                "handler replaced"
            ),
        }

        if self.is_connected() {
            subscribe_patterns(&self.name, self.transport.as_ref(), &[pattern]).await?;
        }
        Ok(())
    }

    /// Opens the transport connection and subscribes every registered pattern.
    ///
    /// Also used by callers to reconnect after [`ConnectionState::Lost`]; the dispatcher
    /// never retries on its own.
    pub async fn connect(&self) -> Result<(), DispatcherError> {
        let listener: Arc<dyn DeliveryListener> = Arc::new(QueueingDeliveryListener::new(
            &self.name,
            self.sender.clone(),
            self.accepting.clone(),
            self.connection_state.clone(),
        ));

        if let Err(err) = self.transport.connect(listener).await {
            warn!(
                event = events::DISPATCHER_CONNECT_FAILED,
                component = COMPONENT,
                dispatcher = self.name.as_str(),
                err = %err,
                "transport connect failed"
            );
            self.connection_state
                .send_replace(ConnectionState::Lost(err.to_string()));
            return Err(err.into());
        }

        self.connection_state
            .send_replace(ConnectionState::Connected);
        let patterns = self.registry.patterns();
        info!(
            event = events::DISPATCHER_CONNECT_OK,
            component = COMPONENT,
            dispatcher = self.name.as_str(),
            pattern_count = patterns.len(),
            "transport connected"
        );

        subscribe_patterns(&self.name, self.transport.as_ref(), &patterns).await?;
        Ok(())
    }

    /// Spawns the dispatch loop on the current tokio runtime.
    pub async fn start(&self) -> Result<(), DispatcherError> {
        let mut loop_state = self.loop_state.lock().await;
        let receiver = match std::mem::take(&mut *loop_state) {
            LoopState::Idle(receiver) => receiver,
            other => {
                *loop_state = other;
                return Err(DispatcherError::AlreadyStarted);
            }
        };

        let worker = DispatchWorker::new(
            &self.name,
            self.registry.clone(),
            self.transport.clone(),
        );
        let handle = spawn_on_current_runtime(DISPATCH_LOOP_TASK_LABEL, worker.run(receiver))
            .map_err(DispatcherError::RuntimeUnavailable)?;
        *loop_state = LoopState::Running(handle);

        info!(
            event = events::DISPATCHER_START,
            component = COMPONENT,
            dispatcher = self.name.as_str(),
            pattern_count = self.registry.len(),
            "dispatch loop started"
        );
        Ok(())
    }

    /// Stops accepting deliveries, waits for already queued messages to be handled, then
    /// releases the transport connection.
    pub async fn stop(&self) -> Result<DispatchStopReport, DispatcherError> {
        let mut loop_state = self.loop_state.lock().await;
        let handle = match std::mem::take(&mut *loop_state) {
            LoopState::Running(handle) => handle,
            other => {
                *loop_state = other;
                return Err(DispatcherError::NotStarted);
            }
        };

        info!(
            event = events::DISPATCHER_STOP_START,
            component = COMPONENT,
            dispatcher = self.name.as_str(),
            "stopping dispatcher"
        );

        self.accepting.store(false, Ordering::Release);
        // The loop may still be draining a full queue, so wait for room rather than drop.
        let _ = self.sender.send(Delivery::Drain).await;

        let report = match handle.await {
            Ok(summary) => DispatchStopReport::from_summary(summary),
            Err(err) => {
                warn!(
                    event = events::DISPATCH_LOOP_ABORTED,
                    component = COMPONENT,
                    dispatcher = self.name.as_str(),
                    err = %err,
                    "dispatch loop ended abnormally"
                );
                DispatchStopReport::default()
            }
        };

        let disconnected = self.transport.disconnect().await;
        self.connection_state
            .send_replace(ConnectionState::Disconnected);

        info!(
            event = events::DISPATCHER_STOP_OK,
            component = COMPONENT,
            dispatcher = self.name.as_str(),
            handled = report.handled,
            failed = report.failed,
            unmatched = report.unmatched,
            "dispatcher stopped"
        );

        disconnected?;
        Ok(report)
    }

    /// Watch channel tracking the transport connection. Reconnection policy belongs to
    /// whoever observes it.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection_state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.connection_state.borrow(), ConnectionState::Connected)
    }

    /// Registered patterns, in evaluation order.
    pub fn patterns(&self) -> Vec<String> {
        self.registry
            .patterns()
            .into_iter()
            .map(|pattern| pattern.as_str().to_string())
            .collect()
    }
}

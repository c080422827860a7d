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

//! Dispatch loop that drains the delivery queue on the application runtime.

use crate::observability::{events, fields};
use crate::routing::handler_registry::HandlerRegistry;
use crate::routing::TopicPattern;
use crate::transport::{TelemetryTransport, TransportError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "dispatch_worker";

/// Unit of work crossing from the network thread to the dispatch loop.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Delivery {
    Message { topic: String, payload: Vec<u8> },
    /// The session came back; every registered pattern is subscribed again.
    Reconnected,
    /// Sentinel queued by `stop`; everything ahead of it is still dispatched.
    Drain,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum DispatchOutcome {
    Handled,
    HandlerFailed,
    HandlerPanicked,
    Unmatched,
}

/// Totals reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub(crate) struct DispatchSummary {
    pub(crate) handled: u64,
    pub(crate) failed: u64,
    pub(crate) unmatched: u64,
}

impl DispatchSummary {
    fn record(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Handled => self.handled += 1,
            DispatchOutcome::HandlerFailed | DispatchOutcome::HandlerPanicked => self.failed += 1,
            DispatchOutcome::Unmatched => self.unmatched += 1,
        }
    }
}

pub(crate) struct DispatchWorker {
    dispatcher_name: String,
    registry: Arc<HandlerRegistry>,
    transport: Arc<dyn TelemetryTransport>,
}

impl DispatchWorker {
    pub(crate) fn new(
        dispatcher_name: &str,
        registry: Arc<HandlerRegistry>,
        transport: Arc<dyn TelemetryTransport>,
    ) -> Self {
        Self {
            dispatcher_name: dispatcher_name.to_string(),
            registry,
            transport,
        }
    }

    /// Processes deliveries one at a time, in queue order, until `Drain` or channel close.
    pub(crate) async fn run(self, mut receiver: Receiver<Delivery>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        while let Some(delivery) = receiver.recv().await {
            match delivery {
                Delivery::Message { topic, payload } => {
                    summary.record(self.dispatch(&topic, &payload).await);
                }
                Delivery::Reconnected => {
                    let patterns = self.registry.patterns();
                    info!(
                        event = events::RESUBSCRIBE_ON_RECONNECT,
                        component = COMPONENT,
                        dispatcher = self.dispatcher_name.as_str(),
                        pattern_count = patterns.len(),
                        "resubscribing after reconnect"
                    );
                    // Failures are logged per pattern; the next reconnect retries them.
                    let _ = subscribe_patterns(
                        &self.dispatcher_name,
                        self.transport.as_ref(),
                        &patterns,
                    )
                    .await;
                }
                Delivery::Drain => break,
            }
        }

        info!(
            event = events::DISPATCH_LOOP_DRAINED,
            component = COMPONENT,
            dispatcher = self.dispatcher_name.as_str(),
            handled = summary.handled,
            failed = summary.failed,
            unmatched = summary.unmatched,
            "dispatch loop drained"
        );
        summary
    }

    /// Runs the first matching handler. Errors and panics stay contained in this message.
    pub(crate) async fn dispatch(&self, topic: &str, payload: &[u8]) -> DispatchOutcome {
        let Some(binding) = self.registry.resolve(topic) else {
            debug!(
                event = events::DISPATCH_UNMATCHED,
                component = COMPONENT,
                dispatcher = self.dispatcher_name.as_str(),
                topic,
                reason = fields::REASON_NO_MATCHING_PATTERN,
                "no handler for topic; dropping message"
            );
            return DispatchOutcome::Unmatched;
        };

        let handled = AssertUnwindSafe(binding.handler.handle(topic, payload))
            .catch_unwind()
            .await;

        match handled {
            Ok(Ok(())) => {
                if tracing::enabled!(Level::DEBUG) {
                    debug!(
                        event = events::DISPATCH_HANDLER_OK,
                        component = COMPONENT,
                        dispatcher = self.dispatcher_name.as_str(),
                        topic,
                        pattern = binding.pattern.as_str(),
                        "handler completed"
                    );
                }
                DispatchOutcome::Handled
            }
            Ok(Err(err)) => {
                warn!(
                    event = events::DISPATCH_HANDLER_FAILED,
                    component = COMPONENT,
                    dispatcher = self.dispatcher_name.as_str(),
                    topic,
                    pattern = binding.pattern.as_str(),
                    payload_preview = fields::format_payload_preview(payload),
                    err = %err,
                    "handler failed"
                );
                DispatchOutcome::HandlerFailed
            }
            Err(panic) => {
                warn!(
                    event = events::DISPATCH_HANDLER_PANICKED,
                    component = COMPONENT,
                    dispatcher = self.dispatcher_name.as_str(),
                    topic,
                    pattern = binding.pattern.as_str(),
                    payload_preview = fields::format_payload_preview(payload),
                    panic = panic_message(panic.as_ref()),
                    "handler panicked"
                );
                DispatchOutcome::HandlerPanicked
            }
        }
    }
}

/// Subscribes every pattern, continuing past failures. Returns the first failure seen.
pub(crate) async fn subscribe_patterns(
    dispatcher_name: &str,
    transport: &dyn TelemetryTransport,
    patterns: &[TopicPattern],
) -> Result<(), TransportError> {
    let mut first_failure = None;

    for pattern in patterns {
        match transport.subscribe(pattern.as_str()).await {
            Ok(()) => {
                info!(
                    event = events::SUBSCRIBE_OK,
                    component = COMPONENT,
                    dispatcher = dispatcher_name,
                    pattern = pattern.as_str(),
                    "subscribed"
                );
            }
            Err(err) => {
                warn!(
                    event = events::SUBSCRIBE_FAILED,
                    component = COMPONENT,
                    dispatcher = dispatcher_name,
                    pattern = pattern.as_str(),
                    err = %err,
                    "subscribe failed"
                );
                first_failure.get_or_insert(err);
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::{subscribe_patterns, Delivery, DispatchOutcome, DispatchSummary, DispatchWorker};
    use crate::routing::handler_registry::HandlerRegistry;
    use crate::routing::{HandlerError, TopicHandler, TopicPattern};
    use crate::transport::{DeliveryListener, TelemetryTransport, TransportError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingTransport {
        subscribed: Mutex<Vec<String>>,
        reject: Option<&'static str>,
    }

    #[async_trait]
    impl TelemetryTransport for RecordingTransport {
        async fn connect(
            &self,
            _listener: Arc<dyn DeliveryListener>,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn subscribe(&self, pattern: &str) -> Result<(), TransportError> {
            if self.reject == Some(pattern) {
                return Err(TransportError::SubscribeFailed {
                    pattern: pattern.to_string(),
                    reason: "denied".to_string(),
                });
            }
            self.subscribed.lock().unwrap().push(pattern.to_string());
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    enum Behavior {
        Record,
        Fail,
        Panic,
    }

    struct ScriptedHandler {
        behavior: Behavior,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TopicHandler for ScriptedHandler {
        async fn handle(&self, topic: &str, payload: &[u8]) -> Result<(), HandlerError> {
            match self.behavior {
                Behavior::Record => {
                    self.seen
                        .lock()
                        .unwrap()
                        .push(format!("{topic}:{}", String::from_utf8_lossy(payload)));
                    Ok(())
                }
                Behavior::Fail => Err("scripted failure".into()),
                Behavior::Panic => panic!("scripted panic"),
            }
        }
    }

    fn worker_with(
        bindings: Vec<(&str, Behavior)>,
        transport: Arc<RecordingTransport>,
    ) -> (DispatchWorker, Arc<Mutex<Vec<String>>>) {
        let registry = Arc::new(HandlerRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for (pattern, behavior) in bindings {
            registry.register(
                TopicPattern::parse(pattern).expect("valid pattern"),
                Arc::new(ScriptedHandler {
                    behavior,
                    seen: seen.clone(),
                }),
            );
        }
        (DispatchWorker::new("test", registry, transport), seen)
    }

    #[tokio::test]
    async fn dispatch_reports_each_outcome() {
        let (worker, seen) = worker_with(
            vec![
                ("ok/+", Behavior::Record),
                ("fail/#", Behavior::Fail),
                ("boom", Behavior::Panic),
            ],
            Arc::new(RecordingTransport::default()),
        );

        assert_eq!(worker.dispatch("ok/1", b"x").await, DispatchOutcome::Handled);
        assert_eq!(
            worker.dispatch("fail/a/b", b"x").await,
            DispatchOutcome::HandlerFailed
        );
        assert_eq!(
            worker.dispatch("boom", b"x").await,
            DispatchOutcome::HandlerPanicked
        );
        assert_eq!(
            worker.dispatch("other", b"x").await,
            DispatchOutcome::Unmatched
        );
        assert_eq!(seen.lock().unwrap().as_slice(), ["ok/1:x"]);
    }

    #[tokio::test]
    async fn loop_survives_panics_and_keeps_order_until_drain() {
        let (worker, seen) = worker_with(
            vec![("ok/+", Behavior::Record), ("boom", Behavior::Panic)],
            Arc::new(RecordingTransport::default()),
        );
        let (sender, receiver) = mpsc::channel(16);
        for delivery in [
            Delivery::Message {
                topic: "ok/1".to_string(),
                payload: b"a".to_vec(),
            },
            Delivery::Message {
                topic: "boom".to_string(),
                payload: b"b".to_vec(),
            },
            Delivery::Message {
                topic: "ok/2".to_string(),
                payload: b"c".to_vec(),
            },
            Delivery::Drain,
            Delivery::Message {
                topic: "ok/3".to_string(),
                payload: b"after-drain".to_vec(),
            },
        ] {
            sender.try_send(delivery).expect("queue has room");
        }

        let summary = worker.run(receiver).await;

        assert_eq!(
            summary,
            DispatchSummary {
                handled: 2,
                failed: 1,
                unmatched: 0
            }
        );
        assert_eq!(seen.lock().unwrap().as_slice(), ["ok/1:a", "ok/2:c"]);
    }

    #[tokio::test]
    async fn reconnect_resubscribes_every_registered_pattern() {
        let transport = Arc::new(RecordingTransport::default());
        let (worker, _) = worker_with(
            vec![("a/+", Behavior::Record), ("b/#", Behavior::Record)],
            transport.clone(),
        );
        let (sender, receiver) = mpsc::channel(4);
        sender.try_send(Delivery::Reconnected).unwrap();
        drop(sender);

        worker.run(receiver).await;

        assert_eq!(transport.subscribed.lock().unwrap().as_slice(), ["a/+", "b/#"]);
    }

    #[tokio::test]
    async fn subscribe_patterns_continues_past_failures() {
        let transport = RecordingTransport {
            subscribed: Mutex::new(Vec::new()),
            reject: Some("a/+"),
        };
        let patterns = vec![
            TopicPattern::parse("a/+").unwrap(),
            TopicPattern::parse("b/+").unwrap(),
        ];

        let result = subscribe_patterns("test", &transport, &patterns).await;

        assert!(matches!(
            result,
            Err(TransportError::SubscribeFailed { ref pattern, .. }) if pattern == "a/+"
        ));
        assert_eq!(transport.subscribed.lock().unwrap().as_slice(), ["b/+"]);
    }
}

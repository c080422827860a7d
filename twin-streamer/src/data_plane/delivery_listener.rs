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

//! Network-thread side of the dispatcher: enqueue and return.

use crate::data_plane::dispatch_worker::Delivery;
use crate::observability::{events, fields};
use crate::transport::{ConnectionState, DeliveryListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tracing::{debug, warn, Level};

const COMPONENT: &str = "delivery_listener";

/// Listener handed to the transport. Every callback is non-blocking: messages go onto a
/// bounded queue with `try_send`, and a full queue drops the message.
pub(crate) struct QueueingDeliveryListener {
    dispatcher_name: String,
    sender: Sender<Delivery>,
    accepting: Arc<AtomicBool>,
    connection_state: Arc<watch::Sender<ConnectionState>>,
}

impl QueueingDeliveryListener {
    pub(crate) fn new(
        dispatcher_name: &str,
        sender: Sender<Delivery>,
        accepting: Arc<AtomicBool>,
        connection_state: Arc<watch::Sender<ConnectionState>>,
    ) -> Self {
        Self {
            dispatcher_name: dispatcher_name.to_string(),
            sender,
            accepting,
            connection_state,
        }
    }

    fn enqueue(&self, delivery: Delivery, topic: &str) {
        match self.sender.try_send(delivery) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    event = events::DELIVERY_QUEUE_FULL,
                    component = COMPONENT,
                    dispatcher = self.dispatcher_name.as_str(),
                    topic,
                    reason = fields::REASON_QUEUE_FULL,
                    "dispatch queue full; dropping delivery"
                );
            }
            Err(TrySendError::Closed(_)) => {
                warn!(
                    event = events::DELIVERY_QUEUE_CLOSED,
                    component = COMPONENT,
                    dispatcher = self.dispatcher_name.as_str(),
                    topic,
                    reason = fields::REASON_QUEUE_CLOSED,
                    "dispatch queue closed; dropping delivery"
                );
            }
        }
    }
}

impl DeliveryListener for QueueingDeliveryListener {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        if !self.accepting.load(Ordering::Acquire) {
            debug!(
                event = events::DELIVERY_DROP_STOPPED,
                component = COMPONENT,
                dispatcher = self.dispatcher_name.as_str(),
                topic,
                reason = fields::REASON_DISPATCHER_STOPPED,
                "dispatcher stopping; dropping delivery"
            );
            return;
        }

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::DELIVERY_RECEIVE,
                component = COMPONENT,
                dispatcher = self.dispatcher_name.as_str(),
                topic,
                payload_len = payload.len(),
                "received delivery"
            );
        }

        self.enqueue(
            Delivery::Message {
                topic: topic.to_string(),
                payload: payload.to_vec(),
            },
            topic,
        );
    }

    fn on_reconnected(&self) {
        self.connection_state.send_replace(ConnectionState::Connected);
        if self.accepting.load(Ordering::Acquire) {
            self.enqueue(Delivery::Reconnected, fields::NONE);
        }
    }

    fn on_connection_lost(&self, reason: &str) {
        warn!(
            event = events::TRANSPORT_CONNECTION_LOST,
            component = COMPONENT,
            dispatcher = self.dispatcher_name.as_str(),
            reason,
            "transport connection lost"
        );
        self.connection_state
            .send_replace(ConnectionState::Lost(reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::QueueingDeliveryListener;
    use crate::data_plane::dispatch_worker::Delivery;
    use crate::transport::{ConnectionState, DeliveryListener};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::{mpsc, watch};

    fn listener(
        queue_size: usize,
    ) -> (
        QueueingDeliveryListener,
        mpsc::Receiver<Delivery>,
        Arc<AtomicBool>,
        watch::Receiver<ConnectionState>,
    ) {
        let (sender, receiver) = mpsc::channel(queue_size);
        let accepting = Arc::new(AtomicBool::new(true));
        let (state_sender, state_receiver) = watch::channel(ConnectionState::Connected);
        (
            QueueingDeliveryListener::new(
                "test",
                sender,
                accepting.clone(),
                Arc::new(state_sender),
            ),
            receiver,
            accepting,
            state_receiver,
        )
    }

    #[test]
    fn messages_are_enqueued_in_delivery_order() {
        let (listener, mut receiver, _, _) = listener(8);

        listener.on_message("a/1", b"first");
        listener.on_message("a/2", b"second");

        assert_eq!(
            receiver.try_recv().ok(),
            Some(Delivery::Message {
                topic: "a/1".to_string(),
                payload: b"first".to_vec()
            })
        );
        assert_eq!(
            receiver.try_recv().ok(),
            Some(Delivery::Message {
                topic: "a/2".to_string(),
                payload: b"second".to_vec()
            })
        );
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (listener, mut receiver, _, _) = listener(1);

        listener.on_message("a/1", b"kept");
        listener.on_message("a/2", b"dropped");

        assert!(receiver.try_recv().is_ok());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn stopped_listener_drops_messages() {
        let (listener, mut receiver, accepting, _) = listener(8);
        accepting.store(false, Ordering::Release);

        listener.on_message("a/1", b"late");

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn connection_events_update_state_and_request_resubscribe() {
        let (listener, mut receiver, _, state) = listener(8);

        listener.on_connection_lost("broker went away");
        assert_eq!(
            *state.borrow(),
            ConnectionState::Lost("broker went away".to_string())
        );

        listener.on_reconnected();
        assert_eq!(*state.borrow(), ConnectionState::Connected);
        assert_eq!(receiver.try_recv().ok(), Some(Delivery::Reconnected));
    }
}

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
use twin_streamer::routing::{HandlerError, TopicHandler};

/// How a [`CollectingHandler`] reacts to a topic.
#[derive(Clone, Debug, Default)]
pub struct HandlerScript {
    pub fail_on: Vec<String>,
    pub panic_on: Vec<String>,
}

/// Records every topic and payload it handles, in handling order.
#[derive(Default)]
pub struct CollectingHandler {
    seen: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    script: HandlerScript,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(script: HandlerScript) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn topics(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl TopicHandler for CollectingHandler {
    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<(), HandlerError> {
        // Suspend once so handlers interleave with other runtime work as real ones do.
        tokio::task::yield_now().await;

        if self.script.panic_on.iter().any(|scripted| scripted == topic) {
            panic!("scripted panic for {topic}");
        }
        self.seen
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        if self.script.fail_on.iter().any(|scripted| scripted == topic) {
            return Err(format!("scripted failure for {topic}").into());
        }
        Ok(())
    }
}

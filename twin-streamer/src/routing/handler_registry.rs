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

//! Ordered pattern -> handler bindings consulted by the dispatch loop.

use crate::routing::topic_matcher::TopicPattern;
use async_trait::async_trait;
use std::error::Error;
use std::sync::{Arc, PoisonError, RwLock};

/// Error type handlers report back to the dispatch loop.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Application work bound to a subscription pattern.
///
/// Handlers run on the application's tokio runtime, never on the transport's network
/// thread, and receive the concrete topic plus the raw payload.
#[async_trait]
pub trait TopicHandler: Send + Sync {
    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<(), HandlerError>;
}

#[derive(Clone)]
pub(crate) struct HandlerBinding {
    pub(crate) pattern: TopicPattern,
    pub(crate) handler: Arc<dyn TopicHandler>,
}

/// Registration outcome, so callers can log replacements distinctly.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Registration {
    Added,
    Replaced,
}

/// Bindings are evaluated in registration order and the first match wins.
///
/// Re-registering an existing pattern swaps its handler in place and keeps its position.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    bindings: RwLock<Vec<HandlerBinding>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(
        &self,
        pattern: TopicPattern,
        handler: Arc<dyn TopicHandler>,
    ) -> Registration {
        let mut bindings = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = bindings
            .iter_mut()
            .find(|binding| binding.pattern == pattern)
        {
            existing.handler = handler;
            return Registration::Replaced;
        }

        bindings.push(HandlerBinding { pattern, handler });
        Registration::Added
    }

    /// Returns the first binding whose pattern matches `topic`.
    pub(crate) fn resolve(&self, topic: &str) -> Option<HandlerBinding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|binding| binding.pattern.matches(topic))
            .cloned()
    }

    pub(crate) fn patterns(&self) -> Vec<TopicPattern> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|binding| binding.pattern.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

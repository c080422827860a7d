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

//! Runtime helper for spawning long-lived loops on the caller's tokio runtime.

use crate::observability::events;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

const COMPONENT: &str = "task_runtime";

/// Returned when a loop is started outside a tokio runtime.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RuntimeUnavailable {
    pub task_label: String,
    pub reason: String,
}

impl Display for RuntimeUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no tokio runtime available to run '{}': {}",
            self.task_label, self.reason
        )
    }
}

impl Error for RuntimeUnavailable {}

pub(crate) fn spawn_on_current_runtime<F>(
    task_label: &str,
    task: F,
) -> Result<JoinHandle<F::Output>, RuntimeUnavailable>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = Handle::try_current().map_err(|err| {
        error!(
            event = events::RUNTIME_SPAWN_FAILED,
            component = COMPONENT,
            task_label,
            err = %err,
            "unable to spawn task"
        );
        RuntimeUnavailable {
            task_label: task_label.to_string(),
            reason: err.to_string(),
        }
    })?;

    let join_handle = handle.spawn(task);
    debug!(
        event = events::RUNTIME_SPAWN_OK,
        component = COMPONENT,
        task_label,
        "spawned task"
    );
    Ok(join_handle)
}

//! Runtime integration layer.
//!
//! Isolates where background loops are spawned so async/threading behavior remains
//! localized and predictable for the rest of the crate. The dispatch loop and the
//! aggregation scheduler both run on the caller's tokio runtime.

pub(crate) mod task_runtime;

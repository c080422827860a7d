//! Data-plane layer.
//!
//! Bridges the transport's network thread onto the application runtime. The delivery
//! listener only enqueues; the dispatch worker drains the queue in order, resolves each
//! topic against the handler registry and runs the bound handler.

pub(crate) mod delivery_listener;
pub(crate) mod dispatch_worker;

//! Routing layer.
//!
//! Owns topic-pattern matching and the ordered pattern -> handler registry. The dispatch
//! loop consults this layer once per delivered message; nothing here performs I/O.

pub(crate) mod handler_registry;
pub(crate) mod topic_matcher;

pub use handler_registry::{HandlerError, TopicHandler};
pub use topic_matcher::{
    matches, TopicPattern, TopicPatternError, LEVEL_SEPARATOR, MULTI_LEVEL_WILDCARD,
    SINGLE_LEVEL_WILDCARD,
};

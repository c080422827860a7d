//! Ingestion layer.
//!
//! Validates wire payloads into [`SensorReading`](crate::model::SensorReading)s and
//! persists them through the reading store gateway. Everything here runs on the
//! application runtime as a [`TopicHandler`](crate::routing::TopicHandler).

pub(crate) mod reading_handler;
pub(crate) mod validator;

pub use reading_handler::{IngestError, ReadingIngestHandler};
pub use validator::{
    canonical_offset_from_minutes, ReadingValidator, ValidationError, ValidatorConfig,
    DEFAULT_CANONICAL_OFFSET_MINUTES,
};

use crate::routing::{LEVEL_SEPARATOR, SINGLE_LEVEL_WILDCARD};

/// Subscription pattern covering every sensor topic under `namespace`.
pub fn sensor_topic_pattern(namespace: &str) -> String {
    let namespace = namespace.trim_end_matches(LEVEL_SEPARATOR);
    format!("{namespace}{LEVEL_SEPARATOR}{SINGLE_LEVEL_WILDCARD}")
}

#[cfg(test)]
mod tests {
    use super::sensor_topic_pattern;

    #[test]
    fn sensor_topic_pattern_appends_single_level_wildcard() {
        assert_eq!(sensor_topic_pattern("water/sensors"), "water/sensors/+");
        assert_eq!(sensor_topic_pattern("water/sensors/"), "water/sensors/+");
    }
}

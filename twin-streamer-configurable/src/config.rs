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

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const MAX_UTC_OFFSET_MINUTES: i32 = 1439;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) twin_streamer_config: TwinStreamerConfig,
    pub(crate) ingestion: IngestionConfig,
    pub(crate) aggregation: AggregationConfig,
    pub(crate) mqtt: MqttConfig,
    #[serde(default)]
    pub(crate) store: StoreConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TwinStreamerConfig {
    pub(crate) name: String,
    pub(crate) message_queue_size: usize,
    #[serde(default)]
    pub(crate) default_water_system_id: Option<String>,
    #[serde(default = "default_utc_offset_minutes")]
    pub(crate) utc_offset_minutes: i32,
}

fn default_utc_offset_minutes() -> i32 {
    twin_streamer::ingestion::DEFAULT_CANONICAL_OFFSET_MINUTES
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct IngestionConfig {
    pub(crate) topic_namespace: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    pub(crate) interval_seconds: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    pub(crate) hostname: String,
    pub(crate) port: u16,
    pub(crate) client_id: String,
    #[serde(default = "default_keep_alive_seconds")]
    pub(crate) keep_alive_seconds: u64,
    #[serde(default = "default_reconnect_delay_seconds")]
    pub(crate) reconnect_delay_seconds: u64,
}

fn default_keep_alive_seconds() -> u64 {
    twin_streamer_mqtt::DEFAULT_KEEP_ALIVE.as_secs()
}

fn default_reconnect_delay_seconds() -> u64 {
    5
}

impl MqttConfig {
    pub(crate) fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_seconds)
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_seconds)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub(crate) seed_file: Option<PathBuf>,
}

/// A config value that parsed but cannot be used.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidConfig(String);

impl Display for InvalidConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl Error for InvalidConfig {}

impl Config {
    pub fn from_json5(contents: &str) -> Result<Self, json5::Error> {
        json5::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let streamer = &self.twin_streamer_config;
        if streamer.message_queue_size == 0 {
            return Err(InvalidConfig(
                "twin_streamer_config.message_queue_size must be greater than zero".to_string(),
            ));
        }
        if streamer.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(InvalidConfig(format!(
                "twin_streamer_config.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
                streamer.utc_offset_minutes
            )));
        }
        if self.ingestion.topic_namespace.trim().is_empty() {
            return Err(InvalidConfig(
                "ingestion.topic_namespace must not be empty".to_string(),
            ));
        }
        if self.aggregation.interval_seconds == 0 {
            return Err(InvalidConfig(
                "aggregation.interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn aggregation_period(&self) -> Duration {
        Duration::from_secs(self.aggregation.interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    const SAMPLE: &str = r#"{
        // comments are allowed
        twin_streamer_config: {
            name: "twin-streamer",
            message_queue_size: 512,
            default_water_system_id: "reservoir-north",
        },
        ingestion: { topic_namespace: "water/sensors" },
        aggregation: { interval_seconds: 60 },
        mqtt: { hostname: "localhost", port: 1883, client_id: "twin-streamer-1" },
    }"#;

    #[test]
    fn sample_config_parses_with_defaults() {
        let config = Config::from_json5(SAMPLE).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.twin_streamer_config.utc_offset_minutes, -180);
        assert_eq!(config.mqtt.keep_alive_seconds, 30);
        assert_eq!(config.mqtt.reconnect_delay_seconds, 5);
        assert!(config.store.seed_file.is_none());
        assert_eq!(
            config.twin_streamer_config.default_water_system_id.as_deref(),
            Some("reservoir-north")
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let with_typo = SAMPLE.replace("interval_seconds", "interval_secs");

        assert!(Config::from_json5(&with_typo).is_err());
    }

    #[test]
    fn zero_interval_is_invalid() {
        let config =
            Config::from_json5(&SAMPLE.replace("interval_seconds: 60", "interval_seconds: 0"))
                .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_queue_size_is_invalid() {
        let config = Config::from_json5(
            &SAMPLE.replace("message_queue_size: 512", "message_queue_size: 0"),
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_offset_is_invalid() {
        let config = Config::from_json5(&SAMPLE.replace(
            "message_queue_size: 512,",
            "message_queue_size: 512, utc_offset_minutes: 1440,",
        ))
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_namespace_is_invalid() {
        let config =
            Config::from_json5(&SAMPLE.replace("\"water/sensors\"", "\"  \"")).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn shipped_config_is_valid() {
        let shipped = include_str!("../TWIN_STREAMER_CONFIG.json5");

        let config = Config::from_json5(shipped).unwrap();

        assert!(config.validate().is_ok());
        assert!(config.store.seed_file.is_some());
    }
}

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

//! Canonical structured field keys and value-format helpers.

use chrono::{DateTime, SecondsFormat, TimeZone};
use std::fmt::Display;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const DISPATCHER: &str = "dispatcher";
pub const TOPIC: &str = "topic";
pub const PATTERN: &str = "pattern";
pub const PAYLOAD_LEN: &str = "payload_len";
pub const PAYLOAD_PREVIEW: &str = "payload_preview";
pub const WATER_SYSTEM_ID: &str = "water_system_id";
pub const SENSOR_ID: &str = "sensor_id";
pub const READING_ID: &str = "reading_id";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_QUEUE_FULL: &str = "queue_full";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const REASON_DISPATCHER_STOPPED: &str = "dispatcher_stopped";
pub const REASON_NO_MATCHING_PATTERN: &str = "no_matching_pattern";

const PAYLOAD_PREVIEW_MAX_CHARS: usize = 96;

/// Renders a payload for debug logs: lossy UTF-8, truncated, never multi-line.
pub fn format_payload_preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    let mut preview: String = text
        .chars()
        .take(PAYLOAD_PREVIEW_MAX_CHARS)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    if text.chars().count() > PAYLOAD_PREVIEW_MAX_CHARS {
        preview.push('…');
    }
    preview
}

pub fn format_optional(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}

/// RFC 3339 with second precision, keeping the timestamp's own offset.
pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::{
        format_optional, format_payload_preview, format_timestamp, NONE,
        PAYLOAD_PREVIEW_MAX_CHARS,
    };
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn payload_preview_flattens_control_characters() {
        assert_eq!(format_payload_preview(b"{\n\"a\":1}"), "{ \"a\":1}");
    }

    #[test]
    fn payload_preview_truncates_long_payloads() {
        let payload = vec![b'x'; PAYLOAD_PREVIEW_MAX_CHARS + 10];
        let preview = format_payload_preview(&payload);

        assert!(preview.ends_with('…'));
        assert_eq!(preview.chars().count(), PAYLOAD_PREVIEW_MAX_CHARS + 1);
    }

    #[test]
    fn format_optional_falls_back_to_none() {
        assert_eq!(format_optional(None), NONE);
        assert_eq!(format_optional(Some("W1")), "W1");
    }

    #[test]
    fn format_timestamp_keeps_offset() {
        let utc = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let local = utc.with_timezone(&FixedOffset::west_opt(3 * 3600).unwrap());

        assert_eq!(format_timestamp(&utc), "2026-03-01T12:30:00Z");
        assert_eq!(format_timestamp(&local), "2026-03-01T09:30:00-03:00");
    }
}

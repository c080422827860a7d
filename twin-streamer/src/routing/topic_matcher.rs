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

//! Subscription-pattern matching over `/`-separated topic levels.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const LEVEL_SEPARATOR: char = '/';
/// Matches exactly one topic level.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";
/// Matches every remaining topic level, including none.
pub const MULTI_LEVEL_WILDCARD: &str = "#";

/// Tests a subscription pattern against a concrete topic.
///
/// ```
/// use twin_streamer::routing::matches;
///
/// assert!(matches("a/+/c", "a/b/c"));
/// assert!(!matches("a/+/c", "a/b/c/d"));
/// assert!(matches("a/#", "a/b/c"));
/// // `#` absorbs zero levels as well.
/// assert!(matches("a/#", "a"));
/// ```
pub fn matches(pattern: &str, topic: &str) -> bool {
    let mut topic_levels = topic.split(LEVEL_SEPARATOR);

    for pattern_level in pattern.split(LEVEL_SEPARATOR) {
        if pattern_level == MULTI_LEVEL_WILDCARD {
            return true;
        }

        match topic_levels.next() {
            Some(_) if pattern_level == SINGLE_LEVEL_WILDCARD => {}
            Some(topic_level) if topic_level == pattern_level => {}
            _ => return false,
        }
    }

    topic_levels.next().is_none()
}

/// Pattern rejected at registration time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TopicPatternError {
    /// `#` used anywhere but as the final level.
    MultiLevelWildcardNotLast(String),
    /// A wildcard sharing a level with other characters, e.g. `a/b+`.
    WildcardInsideLevel(String),
}

impl Display for TopicPatternError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicPatternError::MultiLevelWildcardNotLast(pattern) => {
                write!(f, "'#' must be the last level of pattern '{pattern}'")
            }
            TopicPatternError::WildcardInsideLevel(pattern) => {
                write!(f, "wildcards must occupy a whole level in pattern '{pattern}'")
            }
        }
    }
}

impl Error for TopicPatternError {}

/// A validated subscription pattern.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TopicPattern(String);

impl TopicPattern {
    pub fn parse(pattern: &str) -> Result<Self, TopicPatternError> {
        let levels: Vec<&str> = pattern.split(LEVEL_SEPARATOR).collect();
        let last_index = levels.len() - 1;

        for (index, level) in levels.iter().enumerate() {
            let is_wildcard = *level == SINGLE_LEVEL_WILDCARD || *level == MULTI_LEVEL_WILDCARD;
            if !is_wildcard && (level.contains('+') || level.contains('#')) {
                return Err(TopicPatternError::WildcardInsideLevel(pattern.to_string()));
            }
            if *level == MULTI_LEVEL_WILDCARD && index != last_index {
                return Err(TopicPatternError::MultiLevelWildcardNotLast(
                    pattern.to_string(),
                ));
            }
        }

        Ok(Self(pattern.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, topic: &str) -> bool {
        matches(&self.0, topic)
    }
}

impl Display for TopicPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{matches, TopicPattern, TopicPatternError};

    #[test]
    fn single_level_wildcard_requires_exactly_one_level() {
        assert!(matches("a/+/c", "a/b/c"));
        assert!(!matches("a/+/c", "a/b/c/d"));
        assert!(!matches("a/+/c", "a/c"));
        assert!(!matches("a/+", "a"));
        assert!(matches("sensors/+", "sensors/temperature"));
    }

    #[test]
    fn multi_level_wildcard_absorbs_remaining_levels() {
        assert!(matches("a/#", "a/b/c"));
        assert!(matches("a/#", "a/x"));
        assert!(matches("#", "anything/at/all"));
        assert!(!matches("a/#", "b/x"));
    }

    #[test]
    fn multi_level_wildcard_matches_parent_level() {
        assert!(matches("a/#", "a"));
        assert!(!matches("a/#", "b"));
        assert!(!matches("a/b/#", "a"));
    }

    #[test]
    fn literal_patterns_need_exact_level_count() {
        assert!(matches("a/b", "a/b"));
        assert!(!matches("a/b", "a/b/c"));
        assert!(!matches("a/b/c", "a/b"));
        assert!(!matches("a/b", "a/x"));
    }

    #[test]
    fn empty_pattern_matches_only_empty_topic() {
        assert!(matches("", ""));
        assert!(!matches("", "a"));
        assert!(!matches("a", ""));
    }

    #[test]
    fn parse_rejects_misplaced_wildcards() {
        assert_eq!(
            TopicPattern::parse("a/#/c"),
            Err(TopicPatternError::MultiLevelWildcardNotLast(
                "a/#/c".to_string()
            ))
        );
        assert_eq!(
            TopicPattern::parse("a/b+"),
            Err(TopicPatternError::WildcardInsideLevel("a/b+".to_string()))
        );
        assert!(TopicPattern::parse("water/+/#").is_ok());
        assert!(TopicPattern::parse("#").is_ok());
    }
}

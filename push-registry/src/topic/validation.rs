/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

use crate::config::RegistryConfig;
use crate::errors::{InvalidTopicError, InvalidTopicReason};
use crate::topic::ALL_TOPICS;

pub(crate) fn is_level_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Checks the syntax of a topic name.
///
/// The catch-all literal `*` is a reserved keyword and always passes. Any other topic
/// must consist of non-empty levels of `[A-Za-z0-9._-]` joined by the configured separator.
pub fn validate_topic_name(topic: &str, config: &RegistryConfig) -> Result<(), InvalidTopicError> {
    if topic == ALL_TOPICS {
        return Ok(());
    }
    validate_levels(topic, config)
}

/// Level syntax of a hierarchical name, without the catch-all exemption.
pub(crate) fn validate_levels(topic: &str, config: &RegistryConfig) -> Result<(), InvalidTopicError> {
    if topic.is_empty() {
        return Err(InvalidTopicError::new(topic, InvalidTopicReason::Empty));
    }
    if topic.len() > config.max_topic_length {
        return Err(InvalidTopicError::new(
            topic,
            InvalidTopicReason::TooLong {
                max: config.max_topic_length,
            },
        ));
    }

    for level in topic.split(config.separator) {
        if level.is_empty() {
            return Err(InvalidTopicError::new(topic, InvalidTopicReason::EmptyLevel));
        }
        if let Some(c) = level.chars().find(|c| !is_level_char(*c)) {
            let reason = if c == '*' {
                InvalidTopicReason::MisplacedWildcard
            } else {
                InvalidTopicReason::InvalidCharacter(c)
            };
            return Err(InvalidTopicError::new(topic, reason));
        }
    }

    Ok(())
}

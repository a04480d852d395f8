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

//! Error types surfaced by the registry, its configuration and its subscription sources.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Why a topic string was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidTopicReason {
    Empty,
    TooLong { max: usize },
    EmptyLevel,
    MisplacedWildcard,
    InvalidCharacter(char),
}

impl Display for InvalidTopicReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InvalidTopicReason::Empty => write!(f, "topic is empty"),
            InvalidTopicReason::TooLong { max } => {
                write!(f, "topic exceeds the maximum length of {max} bytes")
            }
            InvalidTopicReason::EmptyLevel => write!(f, "topic contains an empty level"),
            InvalidTopicReason::MisplacedWildcard => {
                write!(f, "wildcard is only allowed as the single trailing level")
            }
            InvalidTopicReason::InvalidCharacter(c) => {
                write!(f, "topic contains the disallowed character {c:?}")
            }
        }
    }
}

/// Raised when a subscription names a topic that does not follow the topic grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidTopicError {
    topic: String,
    reason: InvalidTopicReason,
}

impl InvalidTopicError {
    pub(crate) fn new(topic: &str, reason: InvalidTopicReason) -> Self {
        Self {
            topic: topic.to_string(),
            reason,
        }
    }

    /// The offending topic, exactly as it was supplied.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn reason(&self) -> &InvalidTopicReason {
        &self.reason
    }
}

impl Display for InvalidTopicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid topic {:?}: {}", self.topic, self.reason)
    }
}

impl Error for InvalidTopicError {}

/// Failures while loading or validating a [`RegistryConfig`](crate::RegistryConfig).
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Unable to read registry config: {err}"),
            ConfigError::Parse(err) => write!(f, "Unable to parse registry config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "Invalid registry config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Failures reported by a [`SubscriptionSource`](crate::SubscriptionSource).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// The backing store could not be reached or read.
    Unavailable(String),
    /// The backing store was read but its content is not usable.
    Malformed(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "Subscription source unavailable: {msg}"),
            SourceError::Malformed(msg) => write!(f, "Subscription source malformed: {msg}"),
        }
    }
}

impl Error for SourceError {}

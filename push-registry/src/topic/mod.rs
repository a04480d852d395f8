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

//! Topic grammar, classification and prefix derivation.
//!
//! A topic is either the catch-all literal `*`, a prefix wildcard `<prefix><sep>*`
//! or an exact hierarchical name such as `ox:mail:new`.
//!
//! ```
//! use push_registry::{topic_prefixes, RegistryConfig, TopicExpression};
//!
//! let config = RegistryConfig::default();
//! assert_eq!(
//!     TopicExpression::parse("ox:mail:*", &config).unwrap(),
//!     TopicExpression::Prefix("ox:mail".to_string())
//! );
//!
//! let prefixes: Vec<&str> = topic_prefixes("ox:mail:new", ':').collect();
//! assert_eq!(prefixes, vec!["ox:mail:new", "ox:mail", "ox"]);
//! ```

mod validation;

pub use validation::validate_topic_name;
pub(crate) use validation::is_level_char;
use validation::validate_levels;

use crate::config::RegistryConfig;
use crate::errors::{InvalidTopicError, InvalidTopicReason};

/// The reserved catch-all topic.
pub const ALL_TOPICS: &str = "*";

/// Which index bucket a registered topic belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TopicExpression {
    CatchAll,
    Prefix(String),
    Exact(String),
}

impl TopicExpression {
    /// Validates `topic` and classifies it into exactly one bucket.
    pub fn parse(topic: &str, config: &RegistryConfig) -> Result<Self, InvalidTopicError> {
        if topic == ALL_TOPICS {
            return Ok(TopicExpression::CatchAll);
        }

        if topic.len() > config.max_topic_length {
            return Err(InvalidTopicError::new(
                topic,
                InvalidTopicReason::TooLong {
                    max: config.max_topic_length,
                },
            ));
        }

        let wildcard_suffix = config.wildcard_suffix();
        if let Some(prefix) = topic.strip_suffix(wildcard_suffix.as_str()) {
            validate_levels(prefix, config)
                .map_err(|err| InvalidTopicError::new(topic, err.reason().clone()))?;
            return Ok(TopicExpression::Prefix(prefix.to_string()));
        }

        validate_topic_name(topic, config)?;
        Ok(TopicExpression::Exact(topic.to_string()))
    }

    /// Renders the expression the way it is reported in match descriptors.
    pub fn to_topic_string(&self, separator: char) -> String {
        match self {
            TopicExpression::CatchAll => ALL_TOPICS.to_string(),
            TopicExpression::Prefix(prefix) => wildcard_expression(prefix, separator),
            TopicExpression::Exact(topic) => topic.clone(),
        }
    }
}

/// `<prefix><separator>*`
pub fn wildcard_expression(prefix: &str, separator: char) -> String {
    format!("{prefix}{separator}{ALL_TOPICS}")
}

/// Yields `topic` followed by each ancestor obtained by truncating at the last separator.
pub fn topic_prefixes(topic: &str, separator: char) -> TopicPrefixes<'_> {
    TopicPrefixes {
        next: (!topic.is_empty()).then_some(topic),
        separator,
    }
}

pub struct TopicPrefixes<'a> {
    next: Option<&'a str>,
    separator: char,
}

impl<'a> Iterator for TopicPrefixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current
            .rfind(self.separator)
            .map(|idx| &current[..idx])
            .filter(|ancestor| !ancestor.is_empty());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{topic_prefixes, wildcard_expression, TopicExpression};
    use crate::config::RegistryConfig;
    use crate::errors::InvalidTopicReason;

    #[test]
    fn classifies_each_topic_form() {
        let config = RegistryConfig::default();

        assert_eq!(
            TopicExpression::parse("*", &config).unwrap(),
            TopicExpression::CatchAll
        );
        assert_eq!(
            TopicExpression::parse("folder:*", &config).unwrap(),
            TopicExpression::Prefix("folder".to_string())
        );
        assert_eq!(
            TopicExpression::parse("ox:mail:new", &config).unwrap(),
            TopicExpression::Exact("ox:mail:new".to_string())
        );
    }

    #[test]
    fn rejects_bare_wildcard_suffix_and_repeated_wildcards() {
        let config = RegistryConfig::default();

        let err = TopicExpression::parse(":*", &config).unwrap_err();
        assert_eq!(err.topic(), ":*");
        assert_eq!(err.reason(), &InvalidTopicReason::Empty);

        let err = TopicExpression::parse("a:*:*", &config).unwrap_err();
        assert_eq!(err.topic(), "a:*:*");
        assert_eq!(err.reason(), &InvalidTopicReason::MisplacedWildcard);

        let err = TopicExpression::parse("*:*", &config).unwrap_err();
        assert_eq!(err.topic(), "*:*");
        assert_eq!(err.reason(), &InvalidTopicReason::MisplacedWildcard);
    }

    #[test]
    fn length_limit_counts_the_wildcard_suffix() {
        let config = RegistryConfig {
            max_topic_length: 8,
            ..Default::default()
        };

        assert_eq!(
            TopicExpression::parse("ox:mail:*", &config).unwrap_err().reason(),
            &InvalidTopicReason::TooLong { max: 8 }
        );
        assert_eq!(
            TopicExpression::parse("ox:ma:*", &config).unwrap(),
            TopicExpression::Prefix("ox:ma".to_string())
        );
    }

    #[test]
    fn wildcard_suffix_follows_configured_separator() {
        let config = RegistryConfig {
            separator: '/',
            ..Default::default()
        };

        assert_eq!(
            TopicExpression::parse("folder/*", &config).unwrap(),
            TopicExpression::Prefix("folder".to_string())
        );
        assert!(TopicExpression::parse("folder:*", &config).is_err());
        assert_eq!(wildcard_expression("folder", '/'), "folder/*");
    }

    #[test]
    fn prefixes_run_innermost_first() {
        let prefixes: Vec<&str> = topic_prefixes("a/b/c", '/').collect();
        assert_eq!(prefixes, vec!["a/b/c", "a/b", "a"]);

        let single: Vec<&str> = topic_prefixes("folder", ':').collect();
        assert_eq!(single, vec!["folder"]);

        assert_eq!(topic_prefixes("", ':').count(), 0);
    }

    #[test]
    fn prefixes_stop_at_leading_separator() {
        let prefixes: Vec<&str> = topic_prefixes(":a", ':').collect();
        assert_eq!(prefixes, vec![":a"]);
    }

    #[test]
    fn renders_expressions_for_descriptors() {
        assert_eq!(TopicExpression::CatchAll.to_topic_string(':'), "*");
        assert_eq!(
            TopicExpression::Prefix("ox:mail".to_string()).to_topic_string(':'),
            "ox:mail:*"
        );
        assert_eq!(
            TopicExpression::Exact("ox:mail:new".to_string()).to_topic_string(':'),
            "ox:mail:new"
        );
    }
}

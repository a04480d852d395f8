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

//! Registry configuration.
//!
//! ```
//! use push_registry::RegistryConfig;
//!
//! let config = RegistryConfig::from_json_str(r#"{ "separator": "/" }"#).unwrap();
//! assert_eq!(config.separator, '/');
//! assert_eq!(config.max_topic_length, 256);
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::ConfigError;
use crate::topic::is_level_char;

pub const DEFAULT_SEPARATOR: char = ':';
pub const DEFAULT_MAX_TOPIC_LENGTH: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Level separator of hierarchical topics. The wildcard suffix is this separator followed by `*`.
    pub separator: char,
    /// Upper bound, in bytes, of a registered topic as supplied, wildcard suffix included.
    pub max_topic_length: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            max_topic_length: DEFAULT_MAX_TOPIC_LENGTH,
        }
    }
}

impl RegistryConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("reading registry config from {path:?}");
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator == '*' || self.separator.is_whitespace() || is_level_char(self.separator)
        {
            return Err(ConfigError::Invalid(format!(
                "separator {:?} is reserved or part of the topic level alphabet",
                self.separator
            )));
        }
        if self.max_topic_length == 0 {
            return Err(ConfigError::Invalid(
                "max_topic_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The suffix that marks a prefix subscription, e.g. `:*`.
    pub fn wildcard_suffix(&self) -> String {
        format!("{}*", self.separator)
    }
}

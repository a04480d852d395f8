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

//! Read-only [`SubscriptionSource`] backed by a JSON file.
//!
//! ```json
//! {
//!   "subscriptions": [
//!     { "user_id": 3, "context_id": 1, "client": "mail-app",
//!       "transport_id": "apn", "token": "abcd", "topics": ["ox:mail:new", "*"] }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use push_registry::observability::{events, fields};
use push_registry::{SourceError, Subscription};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, canonicalize};
use std::path::PathBuf;
use tracing::{debug, warn};

const COMPONENT: &str = "push_subscriptions_static_file";

pub struct PushSubscriptionsStaticFile {
    static_file: String,
}

impl PushSubscriptionsStaticFile {
    pub fn new(static_file: String) -> Self {
        Self { static_file }
    }

    fn canonicalized_static_file_path(&self) -> Result<PathBuf, SourceError> {
        let subscription_json_file = PathBuf::from(self.static_file.clone());
        debug!("subscription_json_file: {subscription_json_file:?}");

        canonicalize(subscription_json_file).map_err(|error| {
            SourceError::Unavailable(format!("Static subscription file not found: {error}"))
        })
    }

    fn read_static_config_json(&self) -> Result<Value, SourceError> {
        let subscription_json_file = self.canonicalized_static_file_path()?;
        let data = fs::read_to_string(subscription_json_file).map_err(|error| {
            SourceError::Unavailable(format!("Unable to read file: {error}"))
        })?;

        serde_json::from_str(&data)
            .map_err(|error| SourceError::Malformed(format!("Unable to parse JSON: {error}")))
    }

    fn parse_static_subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
        let value = self.read_static_config_json()?;
        let Some(entries) = value.get("subscriptions").and_then(Value::as_array) else {
            return Err(SourceError::Malformed(
                "Static subscription file must be a JSON object with a \"subscriptions\" array"
                    .to_string(),
            ));
        };

        let mut subscriptions: Vec<Subscription> = Vec::with_capacity(entries.len());
        let mut positions: HashMap<Subscription, usize> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            let subscription = match parse_entry(entry) {
                Ok(subscription) => subscription,
                Err(reason) => {
                    warn!(
                        event = events::STATIC_ENTRY_SKIPPED,
                        component = COMPONENT,
                        index,
                        reason = %reason,
                        "skipping static subscription entry"
                    );
                    continue;
                }
            };

            match positions.get(&subscription) {
                Some(position) => {
                    let merged = &mut subscriptions[*position];
                    for topic in subscription.topics {
                        if !merged.topics.contains(&topic) {
                            merged.topics.push(topic);
                        }
                    }
                }
                None => {
                    positions.insert(subscription.clone(), subscriptions.len());
                    subscriptions.push(subscription);
                }
            }
        }

        Ok(subscriptions)
    }
}

fn parse_entry(entry: &Value) -> Result<Subscription, String> {
    let Some(object) = entry.as_object() else {
        return Err(format!("entry is not an object: {entry}"));
    };

    let user_id = id_field(object, "user_id")?;
    let context_id = id_field(object, "context_id")?;
    let client = text_field(object, "client")?;
    let transport_id = text_field(object, "transport_id")?;
    let token = text_field(object, "token")?;

    let Some(topic_values) = object.get("topics").and_then(Value::as_array) else {
        return Err("\"topics\" must be an array of strings".to_string());
    };
    let mut topics = Vec::with_capacity(topic_values.len());
    for topic_value in topic_values {
        let Some(topic) = topic_value.as_str() else {
            return Err(format!("topic is not a string: {topic_value}"));
        };
        topics.push(topic);
    }
    if topics.is_empty() {
        return Err(format!(
            "subscription of {} has no topics",
            fields::format_scope(user_id, context_id)
        ));
    }

    Ok(Subscription::new(
        user_id,
        context_id,
        client,
        transport_id,
        token,
        topics,
    ))
}

fn id_field(object: &Map<String, Value>, name: &str) -> Result<i32, String> {
    object
        .get(name)
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| format!("\"{name}\" must be a 32-bit integer"))
}

fn text_field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a str, String> {
    match object.get(name).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(format!("\"{name}\" must be a non-empty string")),
    }
}

#[async_trait]
impl push_registry::SubscriptionSource for PushSubscriptionsStaticFile {
    async fn fetch_subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
        let subscriptions = self.parse_static_subscriptions()?;
        debug!(
            component = COMPONENT,
            count = subscriptions.len(),
            "Finished reading subscriptions"
        );
        Ok(subscriptions)
    }
}

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

//! Stable event names and field formatting shared by registry log events.
//!
//! Every event is emitted with `event = events::...` and `component = ...` fields so
//! log pipelines can filter without parsing messages.

pub mod events {
    pub const SUBSCRIPTION_REGISTERED: &str = "subscription_registered";
    pub const SUBSCRIPTION_REGISTER_REJECTED: &str = "subscription_register_rejected";
    pub const SUBSCRIPTION_UNREGISTERED: &str = "subscription_unregistered";
    pub const TOKEN_UNREGISTERED: &str = "token_unregistered";
    pub const TOKEN_UPDATED: &str = "token_updated";
    pub const INTEREST_LOOKUP_EMPTY: &str = "interest_lookup_empty";
    pub const BOOTSTRAP_COMPLETED: &str = "bootstrap_completed";
    pub const BOOTSTRAP_ENTRY_REJECTED: &str = "bootstrap_entry_rejected";
    pub const STATIC_ENTRY_SKIPPED: &str = "static_entry_skipped";
}

pub mod fields {
    const VISIBLE_TOKEN_CHARS: usize = 6;

    /// Delivery tokens are credentials; only a short leading fragment is ever logged.
    pub fn redact_token(token: &str) -> String {
        let visible: String = token.chars().take(VISIBLE_TOKEN_CHARS).collect();
        if visible.len() == token.len() {
            "***".to_string()
        } else {
            format!("{visible}***")
        }
    }

    pub fn format_scope(user_id: i32, context_id: i32) -> String {
        format!("{user_id}@{context_id}")
    }

}

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

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use tracing::trace;

use crate::observability::fields;

pub type UserId = i32;
pub type ContextId = i32;

const SUBSCRIPTION_TAG: &str = "Subscription:";
const SUBSCRIPTION_FN_NEW_TAG: &str = "new():";

/// One client's interest in a set of topics, bound to a delivery credential.
///
/// Two subscriptions are equal when user, context, client, transport and token are equal;
/// the topic set is the interest, not the identity.
#[derive(Clone)]
pub struct Subscription {
    pub user_id: UserId,
    pub context_id: ContextId,
    pub client: String,
    pub transport_id: String,
    pub token: String,
    pub topics: Vec<String>,
}

impl Subscription {
    pub fn new<T: Into<String>>(
        user_id: UserId,
        context_id: ContextId,
        client: &str,
        transport_id: &str,
        token: &str,
        topics: impl IntoIterator<Item = T>,
    ) -> Self {
        trace!(
            "{}:{} Creating Subscription for user {} in context {} ({}/{})",
            SUBSCRIPTION_TAG,
            SUBSCRIPTION_FN_NEW_TAG,
            user_id,
            context_id,
            client,
            transport_id
        );

        Self {
            user_id,
            context_id,
            client: client.to_string(),
            transport_id: transport_id.to_string(),
            token: token.to_string(),
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    /// A copy of this subscription delivering to `token` instead.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            token: token.to_string(),
            ..self.clone()
        }
    }

    #[inline(always)]
    pub fn belongs_to(&self, user_id: UserId, context_id: ContextId) -> bool {
        self.user_id == user_id && self.context_id == context_id
    }

    #[inline(always)]
    pub fn matches_credential(&self, token: &str, transport_id: &str) -> bool {
        self.token == token && self.transport_id == transport_id
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
            && self.context_id == other.context_id
            && self.client == other.client
            && self.transport_id == other.transport_id
            && self.token == other.token
    }
}

impl Eq for Subscription {}

impl Hash for Subscription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_id.hash(state);
        self.context_id.hash(state);
        self.client.hash(state);
        self.transport_id.hash(state);
        self.token.hash(state);
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("user_id", &self.user_id)
            .field("context_id", &self.context_id)
            .field("client", &self.client)
            .field("transport_id", &self.transport_id)
            .field("token", &fields::redact_token(&self.token))
            .field("topics", &self.topics)
            .finish()
    }
}

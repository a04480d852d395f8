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

//! Lookup results: match descriptors grouped per client and transport.

mod collector;

pub(crate) use collector::HitCollector;

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::observability::fields;
use crate::subscription::{ContextId, Subscription, UserId};

/// Grouping key of a lookup result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientAndTransport {
    pub client: String,
    pub transport_id: String,
}

impl ClientAndTransport {
    pub fn new(client: &str, transport_id: &str) -> Self {
        Self {
            client: client.to_string(),
            transport_id: transport_id.to_string(),
        }
    }
}

impl From<&Subscription> for ClientAndTransport {
    fn from(subscription: &Subscription) -> Self {
        Self::new(&subscription.client, &subscription.transport_id)
    }
}

/// One delivery target and the topic expression that selected it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PushMatch {
    pub user_id: UserId,
    pub context_id: ContextId,
    pub client: String,
    pub transport_id: String,
    pub token: String,
    /// `*`, `<prefix><separator>*` or the exact topic, depending on which bucket matched.
    pub topic: String,
}

impl PushMatch {
    pub(crate) fn from_subscription(subscription: &Subscription, topic: &str) -> Self {
        Self {
            user_id: subscription.user_id,
            context_id: subscription.context_id,
            client: subscription.client.clone(),
            transport_id: subscription.transport_id.clone(),
            token: subscription.token.clone(),
            topic: topic.to_string(),
        }
    }

    pub fn client_and_transport(&self) -> ClientAndTransport {
        ClientAndTransport::new(&self.client, &self.transport_id)
    }
}

impl Debug for PushMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushMatch")
            .field("user_id", &self.user_id)
            .field("context_id", &self.context_id)
            .field("client", &self.client)
            .field("transport_id", &self.transport_id)
            .field("token", &fields::redact_token(&self.token))
            .field("topic", &self.topic)
            .finish()
    }
}

type MatchGroup = (ClientAndTransport, Vec<PushMatch>);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Hits {
    Empty,
    MapBacked {
        groups: Vec<MatchGroup>,
        positions: HashMap<ClientAndTransport, usize>,
    },
}

/// Read-only result of an interest lookup.
///
/// Groups keep the order in which their first match was discovered; matches inside a
/// group keep discovery order as well (catch-all, prefixes innermost first, exact).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushHits(Hits);

impl Default for PushHits {
    fn default() -> Self {
        Self::empty()
    }
}

impl PushHits {
    /// The shared "no interest" result. Never allocates.
    pub const fn empty() -> Self {
        PushHits(Hits::Empty)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.0, Hits::Empty)
    }

    /// Number of match descriptors across all groups.
    pub fn len(&self) -> usize {
        self.groups().map(|(_, matches)| matches.len()).sum()
    }

    pub fn group_count(&self) -> usize {
        self.group_slice().len()
    }

    pub fn get(&self, key: &ClientAndTransport) -> Option<&[PushMatch]> {
        match &self.0 {
            Hits::Empty => None,
            Hits::MapBacked { groups, positions } => positions
                .get(key)
                .map(|position| groups[*position].1.as_slice()),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = (&ClientAndTransport, &[PushMatch])> {
        self.group_slice()
            .iter()
            .map(|(key, matches)| (key, matches.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PushMatch> {
        self.group_slice()
            .iter()
            .flat_map(|(_, matches)| matches.iter())
    }

    pub fn into_groups(self) -> Vec<(ClientAndTransport, Vec<PushMatch>)> {
        match self.0 {
            Hits::Empty => Vec::new(),
            Hits::MapBacked { groups, .. } => groups,
        }
    }

    fn group_slice(&self) -> &[MatchGroup] {
        match &self.0 {
            Hits::Empty => &[],
            Hits::MapBacked { groups, .. } => groups.as_slice(),
        }
    }

    fn map_backed(groups: Vec<MatchGroup>, positions: HashMap<ClientAndTransport, usize>) -> Self {
        if groups.is_empty() {
            return Self::empty();
        }
        PushHits(Hits::MapBacked { groups, positions })
    }
}

fn take_matches(group: MatchGroup) -> Vec<PushMatch> {
    group.1
}

impl IntoIterator for PushHits {
    type Item = PushMatch;
    type IntoIter = std::iter::FlatMap<
        std::vec::IntoIter<MatchGroup>,
        Vec<PushMatch>,
        fn(MatchGroup) -> Vec<PushMatch>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.into_groups()
            .into_iter()
            .flat_map(take_matches as fn(MatchGroup) -> Vec<PushMatch>)
    }
}

impl<'a> IntoIterator for &'a PushHits {
    type Item = &'a PushMatch;
    type IntoIter = Box<dyn Iterator<Item = &'a PushMatch> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

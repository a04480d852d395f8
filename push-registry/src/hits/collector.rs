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

use std::collections::HashMap;

use super::{ClientAndTransport, MatchGroup, PushHits, PushMatch};
use crate::subscription::Subscription;

/// Accumulates matches of one lookup, grouped by client and transport in discovery order.
#[derive(Default)]
pub(crate) struct HitCollector {
    groups: Vec<MatchGroup>,
    positions: HashMap<ClientAndTransport, usize>,
}

impl HitCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, subscription: &Subscription, matched_topic: &str) {
        let push_match = PushMatch::from_subscription(subscription, matched_topic);
        let key = ClientAndTransport::from(subscription);

        match self.positions.get(&key) {
            Some(position) => self.groups[*position].1.push(push_match),
            None => {
                self.positions.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![push_match]));
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn finish(self) -> PushHits {
        PushHits::map_backed(self.groups, self.positions)
    }
}

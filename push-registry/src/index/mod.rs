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

//! Matching indexes.
//!
//! Three parallel structures index every registered topic: a catch-all list, a map of
//! prefix buckets and a map of exact-topic buckets. An [`IndexSnapshot`] is immutable once
//! published; writers clone it (sharing every untouched bucket), edit the clone and publish
//! the result as a whole.

mod bucket;

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::Arc;

use bucket::Bucket;

use crate::subscription::{ContextId, Subscription, UserId};
use crate::topic::{topic_prefixes, wildcard_expression, TopicExpression, ALL_TOPICS};

/// Size of the indexes at one snapshot version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub version: u64,
    pub catch_all_entries: usize,
    pub prefix_buckets: usize,
    pub exact_buckets: usize,
    /// Entries across all buckets; a subscription with several topics counts once per topic.
    pub total_entries: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct IndexSnapshot {
    version: u64,
    catch_all: Bucket,
    prefixes: HashMap<String, Bucket>,
    exact: HashMap<String, Bucket>,
}

impl IndexSnapshot {
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    /// A copy to edit and publish as the next version.
    pub(crate) fn next_version(&self) -> Self {
        let mut next = self.clone();
        next.version = self.version + 1;
        next
    }

    pub(crate) fn insert(&mut self, expression: &TopicExpression, entry: Arc<Subscription>) -> bool {
        match expression {
            TopicExpression::CatchAll => self.catch_all.insert(entry),
            TopicExpression::Prefix(prefix) => self
                .prefixes
                .entry(prefix.clone())
                .or_default()
                .insert(entry),
            TopicExpression::Exact(topic) => {
                self.exact.entry(topic.clone()).or_default().insert(entry)
            }
        }
    }

    /// Removes matching entries from every bucket, pruning prefix and exact buckets left empty.
    fn remove_where<P>(&mut self, predicate: P) -> Vec<Arc<Subscription>>
    where
        P: Fn(&Subscription) -> bool,
    {
        let mut removed = self.catch_all.remove_where(&predicate);
        for buckets in [&mut self.prefixes, &mut self.exact] {
            buckets.retain(|_, bucket| {
                removed.extend(bucket.remove_where(&predicate));
                !bucket.is_empty()
            });
        }
        removed
    }

    /// Removes every entry value-equal to `subscription`. Returns the number of entries removed.
    pub(crate) fn remove_equal(&mut self, subscription: &Subscription) -> usize {
        self.remove_where(|entry| entry == subscription).len()
    }

    /// Removes every entry delivering to `(token, transport_id)` and returns the distinct
    /// subscriptions that were dropped.
    pub(crate) fn remove_credential(
        &mut self,
        token: &str,
        transport_id: &str,
    ) -> HashSet<Arc<Subscription>> {
        self.remove_where(|entry| entry.matches_credential(token, transport_id))
            .into_iter()
            .collect()
    }

    pub(crate) fn replace_token(&mut self, subscription: &Subscription, new_token: &str) -> usize {
        let mut replaced = self.catch_all.replace_token(subscription, new_token);
        for bucket in self.prefixes.values_mut().chain(self.exact.values_mut()) {
            if bucket.contains(subscription) {
                replaced += bucket.replace_token(subscription, new_token);
            }
        }
        replaced
    }

    pub(crate) fn contains(&self, subscription: &Subscription) -> bool {
        self.catch_all.contains(subscription)
            || self
                .prefixes
                .values()
                .chain(self.exact.values())
                .any(|bucket| bucket.contains(subscription))
    }

    /// Visits every entry interested in `topic` together with the expression that matched it:
    /// the catch-all bucket, then each prefix bucket from the innermost prefix outwards, then
    /// the exact bucket. Stops as soon as `visit` breaks.
    pub(crate) fn scan_interest<F>(&self, topic: &str, separator: char, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&Subscription, &str) -> ControlFlow<()>,
    {
        for entry in self.catch_all.iter() {
            visit(entry, ALL_TOPICS)?;
        }

        for prefix in topic_prefixes(topic, separator) {
            if let Some(bucket) = self.prefixes.get(prefix) {
                let expression = wildcard_expression(prefix, separator);
                for entry in bucket.iter() {
                    visit(entry, expression.as_str())?;
                }
            }
        }

        if let Some(bucket) = self.exact.get(topic) {
            for entry in bucket.iter() {
                visit(entry, topic)?;
            }
        }

        ControlFlow::Continue(())
    }

    /// The distinct subscriptions of one tenant scope, with the topics they are indexed under.
    pub(crate) fn subscriptions_of(
        &self,
        user_id: UserId,
        context_id: ContextId,
        separator: char,
    ) -> Vec<Subscription> {
        let mut found: Vec<Subscription> = Vec::new();
        let mut positions: HashMap<Arc<Subscription>, usize> = HashMap::new();

        let catch_all = std::iter::once((TopicExpression::CatchAll, &self.catch_all));
        let prefixes = self
            .prefixes
            .iter()
            .map(|(prefix, bucket)| (TopicExpression::Prefix(prefix.clone()), bucket));
        let exact = self
            .exact
            .iter()
            .map(|(topic, bucket)| (TopicExpression::Exact(topic.clone()), bucket));

        for (expression, bucket) in catch_all.chain(prefixes).chain(exact) {
            for entry in bucket.entries() {
                if !entry.belongs_to(user_id, context_id) {
                    continue;
                }
                let topic = expression.to_topic_string(separator);
                match positions.get(entry) {
                    Some(position) => found[*position].topics.push(topic),
                    None => {
                        positions.insert(entry.clone(), found.len());
                        let mut subscription = entry.as_ref().clone();
                        subscription.topics = vec![topic];
                        found.push(subscription);
                    }
                }
            }
        }

        for subscription in &mut found {
            subscription.topics.sort();
        }
        found
    }

    pub(crate) fn stats(&self) -> RegistryStats {
        let catch_all_entries = self.catch_all.len();
        let total_entries = catch_all_entries
            + self
                .prefixes
                .values()
                .chain(self.exact.values())
                .map(Bucket::len)
                .sum::<usize>();

        RegistryStats {
            version: self.version,
            catch_all_entries,
            prefix_buckets: self.prefixes.len(),
            exact_buckets: self.exact.len(),
            total_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IndexSnapshot;
    use crate::subscription::Subscription;
    use crate::topic::TopicExpression;
    use std::ops::ControlFlow;
    use std::sync::Arc;

    fn subscription(user_id: i32, token: &str) -> Arc<Subscription> {
        Arc::new(Subscription::new(user_id, 1, "mail-app", "apn", token, ["*"]))
    }

    fn prefix(p: &str) -> TopicExpression {
        TopicExpression::Prefix(p.to_string())
    }

    fn exact(t: &str) -> TopicExpression {
        TopicExpression::Exact(t.to_string())
    }

    fn scan(index: &IndexSnapshot, topic: &str) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        let _ = index.scan_interest(topic, ':', |entry, matched| {
            seen.push((entry.token.clone(), matched.to_string()));
            ControlFlow::Continue(())
        });
        seen
    }

    #[test]
    fn scan_visits_catch_all_then_prefixes_innermost_first_then_exact() {
        let mut index = IndexSnapshot::default();
        index.insert(&exact("ox:mail:new"), subscription(3, "exact"));
        index.insert(&prefix("ox"), subscription(3, "outer"));
        index.insert(&prefix("ox:mail"), subscription(3, "inner"));
        index.insert(&TopicExpression::CatchAll, subscription(3, "all"));

        assert_eq!(
            scan(&index, "ox:mail:new"),
            vec![
                ("all".to_string(), "*".to_string()),
                ("inner".to_string(), "ox:mail:*".to_string()),
                ("outer".to_string(), "ox:*".to_string()),
                ("exact".to_string(), "ox:mail:new".to_string()),
            ]
        );
    }

    #[test]
    fn scan_uses_only_the_relevant_buckets() {
        let mut index = IndexSnapshot::default();
        index.insert(&prefix("folder"), subscription(3, "folder"));
        index.insert(&exact("news"), subscription(3, "news"));

        assert_eq!(scan(&index, "folderX"), Vec::new());
        assert_eq!(scan(&index, "other"), Vec::new());
        assert_eq!(
            scan(&index, "folder"),
            vec![("folder".to_string(), "folder:*".to_string())]
        );
    }

    #[test]
    fn scan_stops_when_visitor_breaks() {
        let mut index = IndexSnapshot::default();
        index.insert(&TopicExpression::CatchAll, subscription(3, "a"));
        index.insert(&TopicExpression::CatchAll, subscription(4, "b"));

        let mut visited = 0;
        let flow = index.scan_interest("news", ':', |_, _| {
            visited += 1;
            ControlFlow::Break(())
        });

        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(visited, 1);
    }

    #[test]
    fn removal_prunes_empty_buckets() {
        let mut index = IndexSnapshot::default();
        let entry = subscription(3, "token-a");
        index.insert(&prefix("ox"), entry.clone());
        index.insert(&exact("news"), entry.clone());
        index.insert(&exact("news"), subscription(4, "token-b"));

        assert_eq!(index.remove_equal(&entry), 2);

        let stats = index.stats();
        assert_eq!(stats.prefix_buckets, 0);
        assert_eq!(stats.exact_buckets, 1);
        assert_eq!(stats.total_entries, 1);
        assert!(!index.contains(&entry));
    }

    #[test]
    fn remove_credential_reports_distinct_subscriptions() {
        let mut index = IndexSnapshot::default();
        let entry = subscription(3, "token-a");
        index.insert(&TopicExpression::CatchAll, entry.clone());
        index.insert(&exact("news"), entry.clone());
        index.insert(&exact("news"), subscription(4, "token-a"));
        index.insert(&exact("news"), subscription(5, "token-b"));

        let removed = index.remove_credential("token-a", "apn");
        assert_eq!(removed.len(), 2);
        assert_eq!(index.stats().total_entries, 1);
        assert!(index.remove_credential("token-a", "apn").is_empty());
    }

    #[test]
    fn next_version_leaves_published_snapshot_untouched() {
        let mut published = IndexSnapshot::default();
        published.insert(&exact("news"), subscription(3, "token-a"));

        let mut next = published.next_version();
        next.replace_token(&subscription(3, "token-a"), "token-b");

        assert_eq!(next.version(), published.version() + 1);
        assert_eq!(scan(&published, "news")[0].0, "token-a");
        assert_eq!(scan(&next, "news")[0].0, "token-b");
    }

    #[test]
    fn subscriptions_of_rebuilds_topic_sets_per_scope() {
        let mut index = IndexSnapshot::default();
        let entry = Arc::new(Subscription::new(
            3,
            1,
            "mail-app",
            "apn",
            "token-a",
            ["*", "ox:*", "news"],
        ));
        index.insert(&TopicExpression::CatchAll, entry.clone());
        index.insert(&prefix("ox"), entry.clone());
        index.insert(&exact("news"), entry);
        index.insert(&exact("news"), subscription(4, "token-b"));

        let found = index.subscriptions_of(3, 1, ':');
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].topics, vec!["*", "news", "ox:*"]);
        assert!(index.subscriptions_of(3, 2, ':').is_empty());
    }
}

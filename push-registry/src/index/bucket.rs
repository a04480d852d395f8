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

//! Copy-on-write subscription list backing every index bucket.

use std::sync::Arc;

use crate::subscription::Subscription;

/// Entries are shared between snapshots; a write copies the list only when another
/// snapshot still holds it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Bucket {
    entries: Arc<Vec<Arc<Subscription>>>,
}

impl Bucket {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Arc<Subscription>> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn contains(&self, subscription: &Subscription) -> bool {
        self.iter().any(|entry| entry == subscription)
    }

    /// Appends `entry` unless a value-equal subscription is already present.
    pub(crate) fn insert(&mut self, entry: Arc<Subscription>) -> bool {
        if self.contains(&entry) {
            return false;
        }
        Arc::make_mut(&mut self.entries).push(entry);
        true
    }

    /// Removes and returns every entry matching `predicate`.
    pub(crate) fn remove_where<P>(&mut self, predicate: P) -> Vec<Arc<Subscription>>
    where
        P: Fn(&Subscription) -> bool,
    {
        if !self.iter().any(&predicate) {
            return Vec::new();
        }

        let entries = Arc::make_mut(&mut self.entries);
        let mut removed = Vec::new();
        let mut index = 0;
        while index < entries.len() {
            if predicate(entries[index].as_ref()) {
                removed.push(entries.remove(index));
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Swaps each entry equal to `old` for a copy delivering to `new_token`.
    ///
    /// A rotated entry that already exists in the bucket is not added twice.
    pub(crate) fn replace_token(&mut self, old: &Subscription, new_token: &str) -> usize {
        let removed = self.remove_where(|entry| entry == old);
        for entry in &removed {
            self.insert(Arc::new(entry.with_token(new_token)));
        }
        removed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Bucket;
    use crate::subscription::Subscription;
    use std::sync::Arc;

    fn subscription(user_id: i32, token: &str) -> Arc<Subscription> {
        Arc::new(Subscription::new(
            user_id,
            1,
            "mail-app",
            "apn",
            token,
            ["ox:mail:new"],
        ))
    }

    #[test]
    fn insert_dedupes_by_value() {
        let mut bucket = Bucket::default();

        assert!(bucket.insert(subscription(3, "token-a")));
        assert!(!bucket.insert(subscription(3, "token-a")));
        assert!(bucket.insert(subscription(3, "token-b")));
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn writes_do_not_leak_into_cloned_buckets() {
        let mut bucket = Bucket::default();
        bucket.insert(subscription(3, "token-a"));

        let published = bucket.clone();
        bucket.insert(subscription(4, "token-b"));
        bucket.remove_where(|entry| entry.user_id == 3);

        assert_eq!(published.len(), 1);
        assert!(published.contains(&subscription(3, "token-a")));
        assert_eq!(bucket.len(), 1);
        assert!(bucket.contains(&subscription(4, "token-b")));
    }

    #[test]
    fn remove_where_returns_removed_entries() {
        let mut bucket = Bucket::default();
        bucket.insert(subscription(3, "token-a"));
        bucket.insert(subscription(4, "token-a"));
        bucket.insert(subscription(5, "token-b"));

        let removed = bucket.remove_where(|entry| entry.token == "token-a");
        assert_eq!(removed.len(), 2);
        assert_eq!(bucket.len(), 1);
        assert!(bucket.remove_where(|entry| entry.token == "token-a").is_empty());
    }

    #[test]
    fn replace_token_does_not_duplicate_existing_target() {
        let mut bucket = Bucket::default();
        bucket.insert(subscription(3, "token-a"));
        bucket.insert(subscription(3, "token-b"));

        assert_eq!(bucket.replace_token(&subscription(3, "token-a"), "token-b"), 1);
        assert_eq!(bucket.len(), 1);
        assert!(bucket.contains(&subscription(3, "token-b")));
        assert_eq!(bucket.replace_token(&subscription(3, "token-a"), "token-c"), 0);
    }
}

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

//! The subscription registry: register, unregister, rotate tokens and resolve interest.

use arc_swap::ArcSwap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, trace, warn};

use crate::config::RegistryConfig;
use crate::errors::{ConfigError, InvalidTopicError, SourceError};
use crate::hits::{HitCollector, PushHits};
use crate::index::{IndexSnapshot, RegistryStats};
use crate::observability::{events, fields};
use crate::runtime::subscription_runtime::fetch_subscriptions;
use crate::source::{BootstrapReport, SubscriptionSource};
use crate::subscription::{ContextId, Subscription, UserId};
use crate::topic::TopicExpression;

const COMPONENT: &str = "push_subscription_registry";

/// Operations every push subscription registry offers, whatever keeps its state.
pub trait PushSubscriptionRegistry: Send + Sync {
    /// Adds `subscription` under each of its topics.
    ///
    /// All topics are validated before anything is indexed; on error the registry is unchanged.
    fn register_subscription(&self, subscription: &Subscription) -> Result<(), InvalidTopicError>;

    /// Removes every entry value-equal to `subscription`. Returns `false` if there was none.
    fn unregister_subscription(&self, subscription: &Subscription) -> bool;

    /// Removes every subscription delivering to `(token, transport_id)`, whoever owns it.
    /// Returns the number of distinct subscriptions removed.
    fn unregister_by_token(&self, token: &str, transport_id: &str) -> usize;

    /// Re-points every entry of `subscription` at `new_token`, keeping its topics.
    fn update_token(&self, subscription: &Subscription, new_token: &str) -> bool;

    fn get_interested_subscriptions(
        &self,
        user_id: UserId,
        context_id: ContextId,
        topic: &str,
    ) -> PushHits;

    /// One lookup for several users of the same context.
    fn get_interested_subscriptions_for_users(
        &self,
        user_ids: &[UserId],
        context_id: ContextId,
        topic: &str,
    ) -> PushHits;

    fn has_interested_subscriptions(
        &self,
        user_id: UserId,
        context_id: ContextId,
        topic: &str,
    ) -> bool {
        !self
            .get_interested_subscriptions(user_id, context_id, topic)
            .is_empty()
    }

    fn has_interested_subscriptions_for_client(
        &self,
        client: &str,
        user_id: UserId,
        context_id: ContextId,
        topic: &str,
    ) -> bool {
        self.get_interested_subscriptions(user_id, context_id, topic)
            .groups()
            .any(|(key, _)| key.client == client)
    }
}

/// In-memory registry.
///
/// Mutations are serialised by a single lock and publish a new index snapshot in one atomic
/// swap. Lookups load the current snapshot without locking, so they never wait on each other
/// or on a writer, and always observe a complete snapshot.
pub struct InMemoryPushSubscriptionRegistry {
    config: RegistryConfig,
    snapshot: ArcSwap<IndexSnapshot>,
    write_lock: Mutex<()>,
}

impl Default for InMemoryPushSubscriptionRegistry {
    fn default() -> Self {
        Self::with_valid_config(RegistryConfig::default())
    }
}

impl InMemoryPushSubscriptionRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: RegistryConfig) -> Self {
        Self {
            config,
            snapshot: ArcSwap::from_pointee(IndexSnapshot::default()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Version of the currently published snapshot; every effective mutation increments it.
    pub fn version(&self) -> u64 {
        self.snapshot.load().version()
    }

    pub fn stats(&self) -> RegistryStats {
        self.snapshot.load().stats()
    }

    /// Registered subscriptions of one user, with the topics each is indexed under.
    pub fn subscriptions_of(&self, user_id: UserId, context_id: ContextId) -> Vec<Subscription> {
        self.snapshot
            .load()
            .subscriptions_of(user_id, context_id, self.config.separator)
    }

    /// Seeds the registry from `source`, blocking until the source has answered.
    ///
    /// Subscriptions with an invalid topic are skipped and counted as rejected.
    ///
    /// # Panics
    ///
    /// Panics when called from within a current-thread tokio runtime, since the blocking
    /// fetch relies on `tokio::task::block_in_place`. Use [`Self::bootstrap_async`] there.
    pub fn bootstrap(
        &self,
        source: Arc<dyn SubscriptionSource>,
    ) -> Result<BootstrapReport, SourceError> {
        let subscriptions = fetch_subscriptions(source)?;
        Ok(self.register_all(&subscriptions))
    }

    pub async fn bootstrap_async(
        &self,
        source: &dyn SubscriptionSource,
    ) -> Result<BootstrapReport, SourceError> {
        let subscriptions = source.fetch_subscriptions().await?;
        Ok(self.register_all(&subscriptions))
    }

    fn register_all(&self, subscriptions: &[Subscription]) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        for subscription in subscriptions {
            match self.register_subscription(subscription) {
                Ok(()) => report.registered += 1,
                Err(err) => {
                    warn!(
                        event = events::BOOTSTRAP_ENTRY_REJECTED,
                        component = COMPONENT,
                        scope = %fields::format_scope(subscription.user_id, subscription.context_id),
                        client = %subscription.client,
                        err = %err,
                        "skipping stored subscription"
                    );
                    report.rejected += 1;
                }
            }
        }

        info!(
            event = events::BOOTSTRAP_COMPLETED,
            component = COMPONENT,
            registered = report.registered,
            rejected = report.rejected,
            snapshot_version = self.version(),
            "subscription bootstrap completed"
        );
        report
    }

    /// Validates every topic of `subscription`, collapsing duplicates.
    fn parse_topics(
        &self,
        subscription: &Subscription,
    ) -> Result<Vec<TopicExpression>, InvalidTopicError> {
        let mut expressions: Vec<TopicExpression> = Vec::with_capacity(subscription.topics.len());
        for topic in &subscription.topics {
            let expression = TopicExpression::parse(topic, &self.config)?;
            if !expressions.contains(&expression) {
                expressions.push(expression);
            }
        }
        Ok(expressions)
    }

    /// Runs `edit` on a copy of the current snapshot under the write lock and publishes the
    /// copy when `edit` reports a change.
    fn mutate<R, F>(&self, edit: F) -> R
    where
        F: FnOnce(&mut IndexSnapshot) -> (R, bool),
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next = self.snapshot.load().next_version();
        let (result, changed) = edit(&mut next);
        if changed {
            self.snapshot.store(Arc::new(next));
        }
        result
    }

    fn collect_interest<F>(&self, topic: &str, interested: F) -> PushHits
    where
        F: Fn(&Subscription) -> bool,
    {
        let snapshot = self.snapshot.load();
        let mut collector = HitCollector::new();
        let _ = snapshot.scan_interest(topic, self.config.separator, |entry, matched_topic| {
            if interested(entry) {
                collector.add(entry, matched_topic);
            }
            ControlFlow::Continue(())
        });

        if collector.is_empty() {
            trace!(
                event = events::INTEREST_LOOKUP_EMPTY,
                component = COMPONENT,
                topic,
                snapshot_version = snapshot.version(),
                "no interested subscriptions"
            );
            return PushHits::empty();
        }
        collector.finish()
    }

    fn any_interest<F>(&self, topic: &str, interested: F) -> bool
    where
        F: Fn(&Subscription) -> bool,
    {
        self.snapshot
            .load()
            .scan_interest(topic, self.config.separator, |entry, _| {
                if interested(entry) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .is_break()
    }
}

impl PushSubscriptionRegistry for InMemoryPushSubscriptionRegistry {
    fn register_subscription(&self, subscription: &Subscription) -> Result<(), InvalidTopicError> {
        let expressions = match self.parse_topics(subscription) {
            Ok(expressions) => expressions,
            Err(err) => {
                warn!(
                    event = events::SUBSCRIPTION_REGISTER_REJECTED,
                    component = COMPONENT,
                    scope = %fields::format_scope(subscription.user_id, subscription.context_id),
                    client = %subscription.client,
                    transport_id = %subscription.transport_id,
                    err = %err,
                    "rejecting push subscription"
                );
                return Err(err);
            }
        };

        let entry = Arc::new(subscription.clone());
        let inserted = self.mutate(|next| {
            let mut inserted = 0usize;
            for expression in &expressions {
                if next.insert(expression, entry.clone()) {
                    inserted += 1;
                }
            }
            (inserted, inserted > 0)
        });

        debug!(
            event = events::SUBSCRIPTION_REGISTERED,
            component = COMPONENT,
            scope = %fields::format_scope(subscription.user_id, subscription.context_id),
            client = %subscription.client,
            transport_id = %subscription.transport_id,
            token = %fields::redact_token(&subscription.token),
            topics = expressions.len(),
            inserted,
            "registered push subscription"
        );
        Ok(())
    }

    fn unregister_subscription(&self, subscription: &Subscription) -> bool {
        let removed = self.mutate(|next| {
            let removed = next.remove_equal(subscription);
            (removed, removed > 0)
        });

        debug!(
            event = events::SUBSCRIPTION_UNREGISTERED,
            component = COMPONENT,
            scope = %fields::format_scope(subscription.user_id, subscription.context_id),
            client = %subscription.client,
            transport_id = %subscription.transport_id,
            removed,
            "unregistered push subscription"
        );
        removed > 0
    }

    fn unregister_by_token(&self, token: &str, transport_id: &str) -> usize {
        let removed = self.mutate(|next| {
            let removed = next.remove_credential(token, transport_id).len();
            (removed, removed > 0)
        });

        debug!(
            event = events::TOKEN_UNREGISTERED,
            component = COMPONENT,
            transport_id,
            token = %fields::redact_token(token),
            removed,
            "unregistered push subscriptions by token"
        );
        removed
    }

    fn update_token(&self, subscription: &Subscription, new_token: &str) -> bool {
        if subscription.token == new_token {
            return self.snapshot.load().contains(subscription);
        }

        let replaced = self.mutate(|next| {
            let replaced = next.replace_token(subscription, new_token);
            (replaced, replaced > 0)
        });

        debug!(
            event = events::TOKEN_UPDATED,
            component = COMPONENT,
            scope = %fields::format_scope(subscription.user_id, subscription.context_id),
            client = %subscription.client,
            transport_id = %subscription.transport_id,
            old_token = %fields::redact_token(&subscription.token),
            new_token = %fields::redact_token(new_token),
            replaced,
            "updated push subscription token"
        );
        replaced > 0
    }

    fn get_interested_subscriptions(
        &self,
        user_id: UserId,
        context_id: ContextId,
        topic: &str,
    ) -> PushHits {
        self.collect_interest(topic, |entry| entry.belongs_to(user_id, context_id))
    }

    fn get_interested_subscriptions_for_users(
        &self,
        user_ids: &[UserId],
        context_id: ContextId,
        topic: &str,
    ) -> PushHits {
        if user_ids.is_empty() {
            return PushHits::empty();
        }
        self.collect_interest(topic, |entry| {
            entry.context_id == context_id && user_ids.contains(&entry.user_id)
        })
    }

    fn has_interested_subscriptions(
        &self,
        user_id: UserId,
        context_id: ContextId,
        topic: &str,
    ) -> bool {
        self.any_interest(topic, |entry| entry.belongs_to(user_id, context_id))
    }

    fn has_interested_subscriptions_for_client(
        &self,
        client: &str,
        user_id: UserId,
        context_id: ContextId,
        topic: &str,
    ) -> bool {
        self.any_interest(topic, |entry| {
            entry.client == client && entry.belongs_to(user_id, context_id)
        })
    }
}

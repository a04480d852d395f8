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

//! # push-registry
//!
//! `push-registry` keeps track of which push clients want to be notified about which topics and
//! answers, for a user in a context and a concrete event topic, the question "whom do I notify,
//! through which transport, with which token?".
//!
//! A subscription names a tenant scope (user and context), a client, a transport, a device
//! token and one or more topic expressions:
//!
//! - `*` matches every topic,
//! - `prefix:*` matches `prefix` itself and every topic below it,
//! - anything else matches exactly that topic.
//!
//! ## Registering and resolving
//!
//! ```
//! use push_registry::{
//!     ClientAndTransport, InMemoryPushSubscriptionRegistry, PushSubscriptionRegistry, Subscription,
//! };
//!
//! let registry = InMemoryPushSubscriptionRegistry::default();
//! let subscription = Subscription::new(
//!     3,
//!     1,
//!     "mail-app",
//!     "apn",
//!     "device-token",
//!     ["ox:mail:*", "ox:calendar:new"],
//! );
//! registry.register_subscription(&subscription).unwrap();
//!
//! let hits = registry.get_interested_subscriptions(3, 1, "ox:mail:new");
//! let matches = hits
//!     .get(&ClientAndTransport::new("mail-app", "apn"))
//!     .unwrap();
//! assert_eq!(matches[0].token, "device-token");
//! assert_eq!(matches[0].topic, "ox:mail:*");
//!
//! // Other tenants never see this subscription.
//! assert!(registry.get_interested_subscriptions(4, 1, "ox:mail:new").is_empty());
//!
//! // Rotate the device token, then drop the device altogether.
//! assert!(registry.update_token(&subscription, "rotated-token"));
//! assert_eq!(registry.unregister_by_token("rotated-token", "apn"), 1);
//! assert!(!registry.has_interested_subscriptions(3, 1, "ox:mail:new"));
//! ```
//!
//! ## Topic grammar
//!
//! Topics are rejected as a whole subscription when any of them is malformed:
//!
//! ```
//! use push_registry::{
//!     InMemoryPushSubscriptionRegistry, PushSubscriptionRegistry, Subscription,
//! };
//!
//! let registry = InMemoryPushSubscriptionRegistry::default();
//! let subscription = Subscription::new(3, 1, "mail-app", "apn", "t", ["ok", "ox:*:mail"]);
//!
//! let err = registry.register_subscription(&subscription).unwrap_err();
//! assert_eq!(err.topic(), "ox:*:mail");
//! assert!(!registry.has_interested_subscriptions(3, 1, "ok"));
//! ```
//!
//! ## Seeding from a store
//!
//! A registry is empty on creation. Stored subscriptions are loaded through a
//! [`SubscriptionSource`], either from synchronous code with
//! [`InMemoryPushSubscriptionRegistry::bootstrap`] or from async code with
//! [`InMemoryPushSubscriptionRegistry::bootstrap_async`].
//!
//! ## Internal architecture map
//!
//! - Topic: grammar validation and expression parsing
//! - Index: catch-all, prefix and exact buckets held in an immutable snapshot
//! - Registry: serialised writers publishing snapshots, lock-free readers
//! - Hits: grouping of matches per client and transport
//! - Runtime: blocking bridge for the asynchronous subscription source
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. Binaries and tests
//! are responsible for one-time `tracing_subscriber` initialization. Device tokens are only
//! ever logged in redacted form.

mod config;
pub use config::RegistryConfig;

mod errors;
pub use errors::{ConfigError, InvalidTopicError, InvalidTopicReason, SourceError};

mod hits;
pub use hits::{ClientAndTransport, PushHits, PushMatch};

mod index;
pub use index::RegistryStats;

#[doc(hidden)]
pub mod observability;

mod registry;
pub use registry::{InMemoryPushSubscriptionRegistry, PushSubscriptionRegistry};

mod runtime;

mod source;
pub use source::{BootstrapReport, SubscriptionSource};

mod subscription;
pub use subscription::{ContextId, Subscription, UserId};

mod topic;
pub use topic::{
    topic_prefixes, validate_topic_name, wildcard_expression, TopicExpression, TopicPrefixes,
    ALL_TOPICS,
};

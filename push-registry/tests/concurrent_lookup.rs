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

use futures::future::join_all;
use push_registry::{InMemoryPushSubscriptionRegistry, PushSubscriptionRegistry, Subscription};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

const WRITERS: i32 = 4;
const READERS: usize = 4;
const ROUNDS: usize = 200;
const CONTEXT_ID: i32 = 1;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn token(writer: i32, generation: usize) -> String {
    format!("w{writer}-gen{generation}")
}

fn subscription(writer: i32, generation: usize) -> Subscription {
    Subscription::new(
        writer,
        CONTEXT_ID,
        "mail-app",
        "apn",
        &token(writer, generation),
        ["ox:mail:*", "*"],
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_torn_or_mixed_tokens() {
    init_tracing();

    let registry = Arc::new(InMemoryPushSubscriptionRegistry::default());
    let writers_done = Arc::new(AtomicBool::new(false));
    let observed_hits = Arc::new(AtomicUsize::new(0));

    let writers = (0..WRITERS).map(|writer| {
        let registry = registry.clone();
        tokio::spawn(async move {
            for round in 0..ROUNDS {
                let generation = round * 2;
                let current = subscription(writer, generation);
                registry
                    .register_subscription(&current)
                    .expect("valid topics");
                tokio::task::yield_now().await;

                assert!(registry.update_token(&current, &token(writer, generation + 1)));
                tokio::task::yield_now().await;

                if round % 2 == 0 {
                    assert!(registry.unregister_subscription(&subscription(writer, generation + 1)));
                } else {
                    assert_eq!(
                        registry.unregister_by_token(&token(writer, generation + 1), "apn"),
                        1
                    );
                }
            }
        })
    });
    let writers: Vec<_> = writers.collect();

    let readers = (0..READERS).map(|reader| {
        let registry = registry.clone();
        let writers_done = writers_done.clone();
        let observed_hits = observed_hits.clone();
        tokio::spawn(async move {
            let writer = reader as i32 % WRITERS;
            let prefix = format!("w{writer}-gen");
            while !writers_done.load(Ordering::Acquire) {
                let hits = registry.get_interested_subscriptions(writer, CONTEXT_ID, "ox:mail:new");
                let tokens: Vec<&str> = hits.iter().map(|m| m.token.as_str()).collect();

                assert!(
                    tokens.is_empty() || tokens.len() == 2,
                    "partial index update observed: {tokens:?}"
                );
                if let Some(first) = tokens.first() {
                    assert!(first.starts_with(&prefix), "foreign token {first}");
                    assert!(
                        tokens.iter().all(|t| t == first),
                        "old and new token observed together: {tokens:?}"
                    );
                    observed_hits.fetch_add(1, Ordering::Relaxed);
                }
                tokio::task::yield_now().await;
            }
        })
    });
    let readers: Vec<_> = readers.collect();

    for result in join_all(writers).await {
        result.expect("writer task completed");
    }
    writers_done.store(true, Ordering::Release);
    for result in join_all(readers).await {
        result.expect("reader task completed");
    }

    info!(
        observed_hits = observed_hits.load(Ordering::Relaxed),
        "concurrent lookups finished"
    );

    let stats = registry.stats();
    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.prefix_buckets, 0);
}

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

//! Subscription bootstrap runtime integration helpers.

use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::task;

use crate::errors::SourceError;
use crate::source::SubscriptionSource;
use crate::subscription::Subscription;

const THREAD_NUM: usize = 2;

lazy_static! {
    static ref CB_RUNTIME: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(THREAD_NUM)
        .thread_name("push-registry-bootstrap")
        .enable_all()
        .build()
        .expect("Unable to create bootstrap runtime");
}

/// Drives `source` to completion from synchronous code.
///
/// Must not be called from inside a current-thread tokio runtime.
pub(crate) fn fetch_subscriptions(
    source: Arc<dyn SubscriptionSource>,
) -> Result<Vec<Subscription>, SourceError> {
    task::block_in_place(|| CB_RUNTIME.block_on(source.fetch_subscriptions()))
}

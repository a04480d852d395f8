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

use async_trait::async_trait;

use crate::errors::SourceError;
use crate::subscription::Subscription;

/// A store of previously registered subscriptions that a registry can be seeded from.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn fetch_subscriptions(&self) -> Result<Vec<Subscription>, SourceError>;
}

/// Outcome of seeding a registry from a [`SubscriptionSource`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub registered: usize,
    /// Subscriptions skipped because one of their topics failed validation.
    pub rejected: usize,
}

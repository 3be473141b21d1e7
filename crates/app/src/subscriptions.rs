//! Subscription bookkeeping for partition controls.
//!
//! The set of controls worth listening to changes whenever partitions are
//! added, removed, or rewired. [`SubscriptionManager`] keeps the controls
//! currently subscribed and turns a new desired set into an explicit diff,
//! so no handler outlives the partition that needed it.

use std::collections::{BTreeMap, BTreeSet};

use roomjoin_domain::id::{ControlId, SubscriptionId};

/// Diff between the current and the desired subscriptions.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubscriptionPlan {
    /// Subscriptions to cancel.
    pub unsubscribe: Vec<(ControlId, SubscriptionId)>,
    /// Controls to subscribe to.
    pub subscribe: Vec<ControlId>,
}

impl SubscriptionPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unsubscribe.is_empty() && self.subscribe.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    subscribed: BTreeMap<ControlId, SubscriptionId>,
}

impl SubscriptionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the diff towards `desired`.
    ///
    /// Stale entries are forgotten immediately; the caller is expected to
    /// cancel them and to [`record`](Self::record) every new subscription.
    pub fn plan(&mut self, desired: &BTreeSet<ControlId>) -> SubscriptionPlan {
        let stale: Vec<ControlId> = self
            .subscribed
            .keys()
            .filter(|control| !desired.contains(control))
            .copied()
            .collect();
        let unsubscribe = stale
            .into_iter()
            .filter_map(|control| {
                self.subscribed
                    .remove(&control)
                    .map(|subscription| (control, subscription))
            })
            .collect();
        let subscribe = desired
            .iter()
            .filter(|control| !self.subscribed.contains_key(control))
            .copied()
            .collect();
        SubscriptionPlan {
            unsubscribe,
            subscribe,
        }
    }

    /// Store a new subscription.
    ///
    /// Returns the subscription it displaced, which the caller must cancel.
    pub fn record(
        &mut self,
        control: ControlId,
        subscription: SubscriptionId,
    ) -> Option<SubscriptionId> {
        self.subscribed.insert(control, subscription)
    }

    /// Forget every subscription, returning them for cancellation.
    pub fn drain(&mut self) -> Vec<(ControlId, SubscriptionId)> {
        std::mem::take(&mut self.subscribed).into_iter().collect()
    }

    #[must_use]
    pub fn controls(&self) -> BTreeSet<ControlId> {
        self.subscribed.keys().copied().collect()
    }
}

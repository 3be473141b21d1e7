//! Virtual partition control — a wall that opens and closes on command.
//!
//! State changes, whether commanded or simulated by hand with
//! [`VirtualPartitionControl::set_physical`], notify every subscriber
//! synchronously on the calling thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use roomjoin_app::ports::{OpenStatusHandler, PartitionControl};
use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::id::{ControlId, SubscriptionId};

use crate::error::VirtualError;

/// A simulated partition control.
pub struct VirtualPartitionControl {
    id: ControlId,
    name: String,
    open: Mutex<bool>,
    offline: AtomicBool,
    handlers: Mutex<BTreeMap<SubscriptionId, OpenStatusHandler>>,
}

impl VirtualPartitionControl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ControlId::new(), name)
    }

    #[must_use]
    pub fn with_id(id: ControlId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            open: Mutex::new(false),
            offline: AtomicBool::new(false),
            handlers: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulate the partition being moved by hand.
    pub fn set_physical(&self, open: bool) {
        let changed = {
            let mut state = self.lock_open();
            let changed = *state != open;
            *state = open;
            changed
        };
        if changed {
            tracing::debug!(control = %self.id, name = %self.name, open, "partition moved");
            self.notify(open);
        }
    }

    /// Take the control offline: reads and commands fail until it is back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_handlers().len()
    }

    fn ensure_online(&self) -> Result<(), VirtualError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(VirtualError::Offline(self.id))
        } else {
            Ok(())
        }
    }

    fn notify(&self, open: bool) {
        // Handlers may subscribe or unsubscribe, so call them unlocked.
        let handlers: Vec<OpenStatusHandler> = self.lock_handlers().values().cloned().collect();
        for handler in handlers {
            handler(self.id, open);
        }
    }

    fn lock_open(&self) -> MutexGuard<'_, bool> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_handlers(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, OpenStatusHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartitionControl for VirtualPartitionControl {
    fn id(&self) -> ControlId {
        self.id
    }

    fn is_open(&self) -> Result<bool, RoomJoinError> {
        self.ensure_online()?;
        Ok(*self.lock_open())
    }

    fn open(&self) -> Result<(), RoomJoinError> {
        self.ensure_online()?;
        self.set_physical(true);
        Ok(())
    }

    fn close(&self) -> Result<(), RoomJoinError> {
        self.ensure_online()?;
        self.set_physical(false);
        Ok(())
    }

    fn subscribe(&self, handler: OpenStatusHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.lock_handlers().insert(id, handler);
        id
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.lock_handlers().remove(&subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn counting(counter: &Arc<AtomicUsize>) -> OpenStatusHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn should_default_to_closed() {
        let control = VirtualPartitionControl::new("Wall 1");
        assert!(!control.is_open().unwrap());
    }

    #[test]
    fn should_open_and_close_on_command() {
        let control = VirtualPartitionControl::new("Wall 1");
        control.open().unwrap();
        assert!(control.is_open().unwrap());
        control.close().unwrap();
        assert!(!control.is_open().unwrap());
    }

    #[test]
    fn should_notify_subscribers_on_change() {
        let control = VirtualPartitionControl::new("Wall 1");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        control.subscribe(Arc::new(move |id, open| {
            sink.lock().unwrap().push((id, open));
        }));

        control.set_physical(true);

        assert_eq!(*seen.lock().unwrap(), vec![(control.id(), true)]);
    }

    #[test]
    fn should_not_notify_when_state_unchanged() {
        let control = VirtualPartitionControl::new("Wall 1");
        let counter = Arc::new(AtomicUsize::new(0));
        control.subscribe(counting(&counter));

        control.close().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn should_stop_notifying_after_unsubscribe() {
        let control = VirtualPartitionControl::new("Wall 1");
        let counter = Arc::new(AtomicUsize::new(0));
        let subscription = control.subscribe(counting(&counter));

        control.unsubscribe(subscription);
        control.set_physical(true);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(control.subscriber_count(), 0);
    }

    #[test]
    fn should_fail_when_offline() {
        let control = VirtualPartitionControl::new("Wall 1");
        control.set_offline(true);

        assert!(matches!(control.is_open(), Err(RoomJoinError::Control(_))));
        assert!(control.open().is_err());

        control.set_offline(false);
        assert!(control.open().is_ok());
    }

    #[test]
    fn should_allow_handler_to_unsubscribe_itself() {
        let control = Arc::new(VirtualPartitionControl::new("Wall 1"));
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let (weak, inner) = (Arc::downgrade(&control), Arc::clone(&slot));
        let subscription = control.subscribe(Arc::new(move |_, _| {
            if let (Some(control), Some(id)) = (weak.upgrade(), *inner.lock().unwrap()) {
                control.unsubscribe(id);
            }
        }));
        *slot.lock().unwrap() = Some(subscription);

        control.set_physical(true);

        assert_eq!(control.subscriber_count(), 0);
    }
}

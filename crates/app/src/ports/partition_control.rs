//! Partition control port — hardware that senses or drives a partition.
//!
//! A control may only report its state (`Get`), only accept commands
//! (`Set`), or both. Which of those a partition relies on is recorded in
//! its [`PartitionControlInfo`](roomjoin_domain::partition::PartitionControlInfo).

use std::sync::Arc;

use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::id::{ControlId, SubscriptionId};

/// Callback invoked with `(control, is_open)` when a control reports a new
/// open status. May be called from any thread.
pub type OpenStatusHandler = Arc<dyn Fn(ControlId, bool) + Send + Sync>;

/// A single hardware partition control.
pub trait PartitionControl: Send + Sync {
    fn id(&self) -> ControlId;

    /// Current physical state.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Control`] when the control is unreachable.
    fn is_open(&self) -> Result<bool, RoomJoinError>;

    /// Command the partition open. Completion is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Control`] when the command cannot be sent.
    fn open(&self) -> Result<(), RoomJoinError>;

    /// Command the partition closed. Completion is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Control`] when the command cannot be sent.
    fn close(&self) -> Result<(), RoomJoinError>;

    /// Register a handler for open-status changes.
    fn subscribe(&self, handler: OpenStatusHandler) -> SubscriptionId;

    /// Remove a handler. Unknown subscriptions are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);
}

/// Resolves control identities to live controls.
pub trait ControlDirectory: Send + Sync {
    fn get(&self, id: ControlId) -> Option<Arc<dyn PartitionControl>>;
}

impl<T: ControlDirectory> ControlDirectory for Arc<T> {
    fn get(&self, id: ControlId) -> Option<Arc<dyn PartitionControl>> {
        (**self).get(id)
    }
}

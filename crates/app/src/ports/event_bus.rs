//! Event bus port — publish/subscribe for engine events.

use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::event::Event;

/// Publishes engine events to interested subscribers.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to all current subscribers.
    ///
    /// # Errors
    ///
    /// Implementations may fail when the transport is unavailable.
    fn publish(&self, event: Event) -> Result<(), RoomJoinError>;
}

impl<T: EventPublisher> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> Result<(), RoomJoinError> {
        (**self).publish(event)
    }
}

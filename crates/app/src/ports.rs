//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the combination engine and the outside
//! world. They are defined here (in `app`) so that both the engine and the
//! adapter layer can depend on them without creating circular dependencies.
//!
//! Every port is synchronous: the engine reacts to a callback and runs a
//! state transition to completion without suspending.

pub mod event_bus;
pub mod partition_control;
pub mod room_factory;
pub mod room_registry;

pub use event_bus::EventPublisher;
pub use partition_control::{ControlDirectory, OpenStatusHandler, PartitionControl};
pub use room_factory::RoomFactory;
pub use room_registry::RoomRegistry;

//! # roomjoin-app
//!
//! Application layer — the partition engine and its **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `RoomRegistry` — add, remove, update and list rooms
//!   - `PartitionControl` / `ControlDirectory` — sense and drive partitions
//!   - `RoomFactory` — instantiate composite rooms
//!   - `EventPublisher` — announce combinations
//! - Provide the **driving** use-case: `PartitionManager` combines and
//!   uncombines rooms as partitions open and close
//! - Provide **in-process infrastructure** (event bus, subscription
//!   bookkeeping, room membership queries) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `roomjoin-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod partition_manager;
pub mod ports;
pub mod room_graph;
pub mod subscriptions;

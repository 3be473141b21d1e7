//! # roomjoin-domain
//!
//! Pure domain model for the roomjoin room-combination engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Cells** (grid positions optionally occupied by a room)
//! - Define **Partitions** (dividers between two cells, with their controls)
//! - Define **Rooms** (simple rooms and composite rooms built from partitions)
//! - Define the **RoomLayout** (position ↔ room map)
//! - Maintain the **PartitionsCollection** adjacency index and its graph
//!   algorithms (contiguous grouping, split-by-partition)
//! - Define **Events** emitted by the combination engine
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod graph;
pub mod id;
pub mod time;

pub mod cell;
pub mod event;
pub mod layout;
pub mod partition;
pub mod partitions;
pub mod room;

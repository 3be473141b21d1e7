//! # roomjoind — roomjoin daemon
//!
//! Composition root that wires the virtual adapter into the partition engine.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, site file)
//! - Initialise tracing
//! - Build the room registry, the control directory and the partitions
//! - Construct the `PartitionManager`, injecting adapters via port traits
//! - Resynchronise composite rooms with the controls' state and report them
//! - Log engine events until SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod site;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use roomjoin_app::event_bus::InProcessEventBus;
use roomjoin_app::partition_manager::PartitionManager;
use roomjoin_app::ports::room_factory;

use crate::config::Config;
use crate::site::Site;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let site = Site::build(&config)?;
    for partition in site.detached_partitions() {
        tracing::warn!(
            partition = %partition.name,
            "partition separates rooms that are not grid neighbours"
        );
    }

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let mut events = event_bus.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    event = %event.event_type,
                    room = ?event.room_id,
                    partition = ?event.partition_id,
                    data = %event.data,
                    "engine event"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log lagging behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Engine
    let manager = PartitionManager::new(
        Arc::clone(&site.registry),
        Arc::clone(&site.directory),
        Arc::clone(&event_bus),
    );
    let factory = room_factory::named(config.combine.room_name.clone());
    manager.set_event_room_factory(room_factory::named(config.combine.room_name.clone()));
    for partition in site.partitions {
        manager.add_partition(partition)?;
    }
    manager.initialize_combine_rooms(&factory);

    for room in manager.get_top_level_rooms() {
        let master = manager.get_master_room(room.id).map(|master| master.name);
        tracing::info!(
            room = %room.name,
            members = room.rooms.len(),
            partitions = room.partitions.len(),
            master = master.as_deref().unwrap_or("-"),
            "top-level room"
        );
    }

    tracing::info!("roomjoind running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    manager.detach();
    event_log.abort();
    tracing::info!("roomjoind stopped");
    Ok(())
}

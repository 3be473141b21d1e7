//! Partition manager — combines and splits rooms as partitions open and close.
//!
//! The manager owns the canonical [`PartitionsCollection`], listens to every
//! partition control able to report its state, and turns open/close signals
//! or explicit requests into room registry mutations:
//!
//! - **combine**: dissolve the composite rooms the partitions already touch,
//!   group the partitions into contiguous components and create one
//!   composite room per component;
//! - **uncombine**: destroy the composite room holding a partition and
//!   rebuild smaller composite rooms for whatever is still connected.
//!
//! All combine/uncombine sequences are serialised. Control callbacks never
//! block on that serialisation: they queue their event, and whoever finishes
//! the running sequence drains the queue.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};

use roomjoin_domain::cell::Cell;
use roomjoin_domain::error::{NotFoundError, RoomJoinError};
use roomjoin_domain::event::{Event, EventType};
use roomjoin_domain::id::{ControlId, PartitionId, RoomId};
use roomjoin_domain::partition::{Partition, PartitionControlInfo, PartitionFeedback};
use roomjoin_domain::partitions::PartitionsCollection;
use roomjoin_domain::room::{Room, RoomOrigin};

use crate::ports::room_factory;
use crate::ports::{
    ControlDirectory, EventPublisher, OpenStatusHandler, RoomFactory, RoomRegistry,
};
use crate::room_graph::RoomGraph;
use crate::subscriptions::SubscriptionManager;

/// Name given to composite rooms created in response to control events.
pub const DEFAULT_COMBINED_ROOM_NAME: &str = "Combined Room";

type SharedFactory = Arc<dyn RoomFactory + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct ControlEvent {
    control: ControlId,
    open: bool,
}

#[derive(Debug, Default)]
struct ManagerState {
    partitions: PartitionsCollection,
    subscriptions: SubscriptionManager,
    /// Last commanded state per control, used for controls without `Get`.
    commanded: HashMap<ControlId, bool>,
}

/// Orchestrates the combine/uncombine lifecycle of composite rooms.
pub struct PartitionManager<R, C, P> {
    registry: R,
    controls: C,
    publisher: P,
    state: Mutex<ManagerState>,
    sequence: Mutex<()>,
    pending: Mutex<VecDeque<ControlEvent>>,
    event_factory: Mutex<SharedFactory>,
    me: Weak<Self>,
}

impl<R, C, P> PartitionManager<R, C, P>
where
    R: RoomRegistry + 'static,
    C: ControlDirectory + 'static,
    P: EventPublisher + 'static,
{
    /// Create a manager with no partitions.
    pub fn new(registry: R, controls: C, publisher: P) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            registry,
            controls,
            publisher,
            state: Mutex::new(ManagerState::default()),
            sequence: Mutex::new(()),
            pending: Mutex::new(VecDeque::new()),
            event_factory: Mutex::new(Arc::new(room_factory::named(DEFAULT_COMBINED_ROOM_NAME))),
            me: me.clone(),
        })
    }

    /// Factory used when a control event triggers a combination.
    pub fn set_event_room_factory(&self, factory: impl RoomFactory + Send + Sync + 'static) {
        *self
            .event_factory
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(factory);
    }

    // ── Partition set ──────────────────────────────────────────────

    /// Add a partition, or replace the one with the same id.
    ///
    /// A replaced partition is split out of its composite room first and
    /// recombined afterwards if it is open.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Validation`] if the partition is invalid.
    #[tracing::instrument(skip(self, partition), fields(partition = %partition.name))]
    pub fn add_partition(&self, partition: Partition) -> Result<(), RoomJoinError> {
        partition.validate()?;
        let id = partition.id;
        let exists = self.lock_state().partitions.get(id).is_some();
        if exists {
            self.change_partition(id, move |partitions| {
                partitions.insert(partition);
                Ok(())
            })
        } else {
            {
                let _sequence = self.lock_sequence();
                self.lock_state().partitions.insert(partition);
                self.refresh_subscriptions();
            }
            self.drain_pending();
            Ok(())
        }
    }

    /// Remove a partition, splitting it out of its composite room first.
    #[tracing::instrument(skip(self))]
    pub fn remove_partition(&self, id: PartitionId) -> Option<Partition> {
        let removed = {
            let _sequence = self.lock_sequence();
            let factory = self.event_factory();
            self.split_off(&BTreeSet::from([id]), &*factory, false);
            let removed = self.lock_state().partitions.remove(id);
            self.refresh_subscriptions();
            removed
        };
        self.drain_pending();
        removed
    }

    /// Rewire the controls of a partition.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::NotFound`] when `id` is unknown.
    #[tracing::instrument(skip(self, controls))]
    pub fn set_partition_controls(
        &self,
        id: PartitionId,
        controls: BTreeSet<PartitionControlInfo>,
    ) -> Result<(), RoomJoinError> {
        self.change_partition(id, move |partitions| {
            partitions.set_partition_controls(id, controls)
        })
    }

    /// Move a partition between cells.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::NotFound`] when `id` is unknown.
    #[tracing::instrument(skip(self))]
    pub fn set_partition_cells(
        &self,
        id: PartitionId,
        cell_a: Option<Cell>,
        cell_b: Option<Cell>,
    ) -> Result<(), RoomJoinError> {
        self.change_partition(id, move |partitions| {
            partitions.set_partition_cells(id, cell_a, cell_b)
        })
    }

    #[must_use]
    pub fn get_partition(&self, id: PartitionId) -> Option<Partition> {
        self.lock_state().partitions.get(id).cloned()
    }

    #[must_use]
    pub fn partitions(&self) -> Vec<Partition> {
        self.lock_state().partitions.iter().cloned().collect()
    }

    /// Run a read-only query against the adjacency index.
    pub fn with_partitions<T>(&self, query: impl FnOnce(&PartitionsCollection) -> T) -> T {
        query(&self.lock_state().partitions)
    }

    /// Controls the manager currently listens to.
    #[must_use]
    pub fn subscribed_controls(&self) -> BTreeSet<ControlId> {
        self.lock_state().subscriptions.controls()
    }

    /// Cancel every control subscription.
    pub fn detach(&self) {
        let subscriptions = self.lock_state().subscriptions.drain();
        for (control, subscription) in subscriptions {
            if let Some(handle) = self.controls.get(control) {
                handle.unsubscribe(subscription);
            }
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Whether any control reports (or was last commanded) open.
    ///
    /// Controls with `Get` feedback are read; the others fall back to the
    /// last command sent, defaulting to closed.
    #[must_use]
    pub fn is_partition_open(&self, id: PartitionId) -> bool {
        let (controls, commanded) = {
            let state = self.lock_state();
            let Some(partition) = state.partitions.get(id) else {
                return false;
            };
            (partition.controls.clone(), state.commanded.clone())
        };
        controls.iter().any(|info| {
            if info.feedback.contains(PartitionFeedback::GET) {
                self.read_control(info.control)
            } else {
                commanded.get(&info.control).copied().unwrap_or(false)
            }
        })
    }

    /// The composite room whose membership contains `partition`.
    #[must_use]
    pub fn get_combine_room(&self, partition: PartitionId) -> Option<Room> {
        self.room_graph().combine_room_of(partition).cloned()
    }

    /// Composite rooms plus every simple room they did not absorb.
    #[must_use]
    pub fn get_top_level_rooms(&self) -> Vec<Room> {
        self.room_graph()
            .top_level_rooms()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Member of a composite room preferred as master.
    #[must_use]
    pub fn get_master_room(&self, room: RoomId) -> Option<Room> {
        self.room_graph().master_room(room).cloned()
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Combine the rooms joined by `partitions`.
    #[tracing::instrument(skip(self, partitions, factory), fields(count = partitions.len()))]
    pub fn combine_rooms(&self, partitions: &BTreeSet<PartitionId>, factory: &impl RoomFactory) {
        {
            let _sequence = self.lock_sequence();
            self.combine_locked(partitions, factory);
        }
        self.drain_pending();
    }

    /// Split `partition` out of its composite room.
    #[tracing::instrument(skip(self, factory))]
    pub fn uncombine_rooms(&self, partition: PartitionId, factory: &impl RoomFactory) {
        {
            let _sequence = self.lock_sequence();
            self.uncombine_locked(&BTreeSet::from([partition]), factory);
        }
        self.drain_pending();
    }

    /// Uncombine when `partition` is combined, combine otherwise.
    #[tracing::instrument(skip(self, factory))]
    pub fn toggle_combine_rooms(&self, partition: PartitionId, factory: &impl RoomFactory) {
        {
            let _sequence = self.lock_sequence();
            if self.get_combine_room(partition).is_some() {
                self.uncombine_locked(&BTreeSet::from([partition]), factory);
            } else {
                self.combine_locked(&BTreeSet::from([partition]), factory);
            }
        }
        self.drain_pending();
    }

    /// Resynchronise composite rooms with the partitions' current state.
    ///
    /// Closed partitions are uncombined, then all open partitions are
    /// combined. Running it again yields the same combinations.
    #[tracing::instrument(skip(self, factory))]
    pub fn initialize_combine_rooms(&self, factory: &impl RoomFactory) {
        {
            let _sequence = self.lock_sequence();
            let ids = self.lock_state().partitions.ids();
            let (open, closed): (BTreeSet<PartitionId>, BTreeSet<PartitionId>) =
                ids.into_iter().partition(|id| self.is_partition_open(*id));
            tracing::info!(
                open = open.len(),
                closed = closed.len(),
                "resyncing partitions"
            );
            self.uncombine_locked(&closed, factory);
            self.combine_locked(&open, factory);
        }
        self.drain_pending();
    }

    // ── Sequence internals (caller holds `sequence`) ───────────────

    fn combine_locked(&self, requested: &BTreeSet<PartitionId>, factory: &dyn RoomFactory) {
        let participating = self.participating(requested);
        if participating.is_empty() {
            tracing::debug!("no partition joins any room");
            return;
        }

        let touched_rooms = self.lock_state().partitions.rooms_of(&participating);
        let graph = self.room_graph();
        let overlapping: Vec<Room> = graph
            .iter()
            .filter(|room| room.is_engine_created())
            .filter(|room| {
                !room.partitions.is_disjoint(&participating)
                    || !graph.recursive_rooms(room.id).is_disjoint(&touched_rooms)
            })
            .cloned()
            .collect();

        let mut absorbed = participating;
        for room in &overlapping {
            absorbed.extend(
                graph
                    .recursive_partitions(room.id)
                    .into_iter()
                    .filter(|id| !self.reports_closed(*id)),
            );
            self.destroy_room(room, &graph);
        }

        let absorbed = self.participating(&absorbed);
        let groups = self.lock_state().partitions.group_contiguous(&absorbed);
        for group in groups {
            self.create_combined_room(&group, factory);
        }
    }

    fn uncombine_locked(&self, partitions: &BTreeSet<PartitionId>, factory: &dyn RoomFactory) {
        let joining: BTreeSet<PartitionId> = {
            let state = self.lock_state();
            partitions
                .iter()
                .copied()
                .filter(|id| {
                    let rooms_count =
                        state.partitions.get(*id).map_or(0, Partition::rooms_count);
                    if rooms_count <= 1 {
                        tracing::debug!(
                            partition = %id,
                            rooms_count,
                            "partition joins fewer than two rooms"
                        );
                    }
                    rooms_count > 1
                })
                .collect()
        };
        if !joining.is_empty() {
            self.split_off(&joining, factory, true);
        }
    }

    /// Destroy every composite room holding one of `split` and rebuild what
    /// is still connected without them.
    ///
    /// Members whose `Get` controls report closed are left out of the rebuilt
    /// groups as well. With `close_released`, partitions left out are
    /// commanded closed.
    fn split_off(
        &self,
        split: &BTreeSet<PartitionId>,
        factory: &dyn RoomFactory,
        close_released: bool,
    ) {
        let graph = self.room_graph();
        let rooms: BTreeMap<RoomId, &Room> = split
            .iter()
            .filter_map(|id| graph.combine_room_of(*id))
            .filter(|room| {
                if !room.is_engine_created() {
                    tracing::debug!(
                        room = %room.id,
                        "composite room is not owned by the engine"
                    );
                }
                room.is_engine_created()
            })
            .map(|room| (room.id, room))
            .collect();

        let mut groups = Vec::new();
        let mut released = BTreeSet::new();
        for room in rooms.values() {
            let members = graph.recursive_partitions(room.id);
            let removed: BTreeSet<PartitionId> = members
                .iter()
                .copied()
                .filter(|id| split.contains(id) || self.reports_closed(*id))
                .collect();
            let rebuilt = self
                .lock_state()
                .partitions
                .split_by_partitions(&members, &removed);
            let kept: BTreeSet<PartitionId> = rebuilt.iter().flatten().copied().collect();
            released.extend(members.difference(&kept).copied());
            groups.extend(rebuilt);
        }

        if close_released {
            self.command(&released, false);
        }
        for room in rooms.values() {
            self.destroy_room(room, &graph);
        }
        for group in groups.iter().filter(|group| !group.is_empty()) {
            self.combine_locked(group, factory);
        }
    }

    fn create_combined_room(&self, group: &BTreeSet<PartitionId>, factory: &dyn RoomFactory) {
        let rooms = self.lock_state().partitions.rooms_of(group);
        if rooms.len() < 2 {
            tracing::debug!(partitions = group.len(), "group joins fewer than two rooms");
            return;
        }

        let mut room = match factory.create_room() {
            Ok(room) => room,
            Err(err) => {
                self.report_failure(group, &err);
                return;
            }
        };
        room.id = RoomId::new();
        room.origin = RoomOrigin::Combined;
        room.combine_state = false;
        room.rooms.clone_from(&rooms);
        room.partitions.clone_from(group);

        let graph = self.room_graph();
        if let Some(master) = rooms
            .iter()
            .filter_map(|id| graph.get(*id))
            .min_by_key(|member| (member.combine_priority, member.id))
        {
            room.combine_priority = master.combine_priority;
        }

        if let Err(err) = room
            .validate()
            .and_then(|()| self.registry.add_room(room.clone()))
        {
            self.report_failure(group, &err);
            return;
        }

        self.command(group, true);
        self.mark_members(room.id, true);

        tracing::info!(
            room = %room.id,
            name = %room.name,
            rooms = rooms.len(),
            partitions = group.len(),
            "rooms combined"
        );
        self.publish(Event::new(
            EventType::RoomsCombined,
            Some(room.id),
            serde_json::json!({
                "name": room.name,
                "rooms": rooms,
                "partitions": group,
            }),
        ));
    }

    fn destroy_room(&self, room: &Room, graph: &RoomGraph) {
        if let Err(err) = self.registry.remove_room(room.id) {
            tracing::warn!(room = %room.id, error = %err, "failed to remove composite room");
        }
        for member in graph.recursive_rooms(room.id) {
            self.set_combine_state(member, false);
        }
        tracing::info!(room = %room.id, name = %room.name, "rooms uncombined");
        self.publish(Event::new(
            EventType::RoomsUncombined,
            Some(room.id),
            serde_json::json!({
                "name": room.name,
                "rooms": room.rooms,
                "partitions": room.partitions,
            }),
        ));
    }

    fn report_failure(&self, group: &BTreeSet<PartitionId>, err: &RoomJoinError) {
        tracing::warn!(partitions = ?group, error = %err, "failed to combine partition group");
        self.publish(Event::new(
            EventType::CombineFailed,
            None,
            serde_json::json!({
                "partitions": group,
                "error": err.to_string(),
            }),
        ));
    }

    fn mark_members(&self, room: RoomId, entered: bool) {
        let graph = self.room_graph();
        for member in graph.recursive_rooms(room) {
            self.set_combine_state(member, entered);
        }
    }

    fn set_combine_state(&self, id: RoomId, entered: bool) {
        let Some(mut room) = self.registry.get_room(id) else {
            return;
        };
        if entered {
            room.enter_combine_state();
        } else {
            room.leave_combine_state();
        }
        if let Err(err) = self.registry.update_room(room) {
            tracing::warn!(room = %id, error = %err, "failed to update combine state");
        }
    }

    /// Known, non-inert partitions among `ids`.
    fn participating(&self, ids: &BTreeSet<PartitionId>) -> BTreeSet<PartitionId> {
        let state = self.lock_state();
        ids.iter()
            .copied()
            .filter(|id| {
                state
                    .partitions
                    .get(*id)
                    .is_some_and(|partition| !partition.is_inert())
            })
            .collect()
    }

    /// Send `open`/`close` to every `Set` control of `partitions`.
    fn command(&self, partitions: &BTreeSet<PartitionId>, open: bool) {
        let targets: BTreeSet<ControlId> = {
            let mut state = self.lock_state();
            let targets: BTreeSet<ControlId> = partitions
                .iter()
                .filter_map(|id| state.partitions.get(*id))
                .flat_map(|partition| partition.set_controls().collect::<Vec<_>>())
                .collect();
            for control in &targets {
                state.commanded.insert(*control, open);
            }
            targets
        };

        for control in targets {
            let Some(handle) = self.controls.get(control) else {
                tracing::warn!(%control, "unknown partition control");
                continue;
            };
            let result = if open { handle.open() } else { handle.close() };
            if let Err(err) = result {
                tracing::warn!(%control, open, error = %err, "partition control command failed");
            }
        }
    }

    /// A partition with `Get` feedback whose controls all read closed.
    fn reports_closed(&self, id: PartitionId) -> bool {
        let has_get = {
            let state = self.lock_state();
            let Some(partition) = state.partitions.get(id) else {
                return false;
            };
            partition.get_controls().next().is_some()
        };
        has_get && !self.is_partition_open(id)
    }

    fn read_control(&self, control: ControlId) -> bool {
        let Some(handle) = self.controls.get(control) else {
            tracing::warn!(%control, "unknown partition control");
            return false;
        };
        handle.is_open().unwrap_or_else(|err| {
            tracing::warn!(%control, error = %err, "failed to read partition control");
            false
        })
    }

    /// Apply a structural change to one partition.
    ///
    /// The partition leaves its composite room under its old geometry and is
    /// recombined under the new one when open.
    fn change_partition<F>(&self, id: PartitionId, change: F) -> Result<(), RoomJoinError>
    where
        F: FnOnce(&mut PartitionsCollection) -> Result<(), RoomJoinError>,
    {
        let result = {
            let _sequence = self.lock_sequence();
            let exists = self.lock_state().partitions.get(id).is_some();
            if exists {
                let factory = self.event_factory();
                self.split_off(&BTreeSet::from([id]), &*factory, false);
                let result = change(&mut self.lock_state().partitions);
                self.refresh_subscriptions();
                if result.is_ok() && self.is_partition_open(id) {
                    self.combine_locked(&BTreeSet::from([id]), &*factory);
                }
                result
            } else {
                Err(NotFoundError {
                    entity: "Partition",
                    id: id.to_string(),
                }
                .into())
            }
        };
        self.drain_pending();
        result
    }

    // ── Control subscriptions ──────────────────────────────────────

    /// Bring subscriptions in line with the controls able to report state.
    ///
    /// Control calls happen outside the state lock, since a control may
    /// invoke its handler while subscribing.
    fn refresh_subscriptions(&self) {
        let plan = {
            let mut state = self.lock_state();
            let desired = state.partitions.control_ids_with(PartitionFeedback::GET);
            state.subscriptions.plan(&desired)
        };
        if plan.is_empty() {
            return;
        }

        for (control, subscription) in plan.unsubscribe {
            if let Some(handle) = self.controls.get(control) {
                handle.unsubscribe(subscription);
            }
        }
        for control in plan.subscribe {
            let Some(handle) = self.controls.get(control) else {
                tracing::warn!(%control, "cannot subscribe to unknown partition control");
                continue;
            };
            let subscription = handle.subscribe(self.handler());
            let displaced = self
                .lock_state()
                .subscriptions
                .record(control, subscription);
            if let Some(displaced) = displaced {
                handle.unsubscribe(displaced);
            }
            tracing::debug!(%control, "subscribed to partition control");
        }
    }

    fn handler(&self) -> OpenStatusHandler {
        let me = self.me.clone();
        Arc::new(move |control, open| {
            if let Some(manager) = me.upgrade() {
                manager.on_open_status_changed(control, open);
            }
        })
    }

    fn on_open_status_changed(&self, control: ControlId, open: bool) {
        let event = ControlEvent { control, open };
        self.lock_pending().push_back(event);
        self.drain_pending();
    }

    /// Process queued control events unless a sequence is already running;
    /// the running sequence drains the queue once it finishes.
    fn drain_pending(&self) {
        loop {
            let guard = match self.sequence.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            while let Some(event) = self.next_pending() {
                self.apply_control_event(event);
            }
            drop(guard);
            if self.lock_pending().is_empty() {
                return;
            }
        }
    }

    fn next_pending(&self) -> Option<ControlEvent> {
        self.lock_pending().pop_front()
    }

    /// Partitions sharing the control are settled together, so closing one
    /// never rebuilds a sibling behind the same closed wall.
    fn apply_control_event(&self, event: ControlEvent) {
        let partitions = self.lock_state().partitions.get_partitions(event.control);
        let mut opened = BTreeSet::new();
        let mut closed = BTreeSet::new();
        for id in partitions {
            let open = self.is_partition_open(id);
            let combined = self.get_combine_room(id).is_some();
            tracing::debug!(
                control = %event.control,
                reported = event.open,
                partition = %id,
                open,
                combined,
                "partition status changed"
            );
            self.publish(
                Event::new(
                    EventType::PartitionStatusChanged,
                    None,
                    serde_json::json!({
                        "control": event.control,
                        "open": open,
                    }),
                )
                .with_partition(id),
            );
            match (open, combined) {
                (true, false) => {
                    opened.insert(id);
                }
                (false, true) => {
                    closed.insert(id);
                }
                _ => {}
            }
        }

        let factory = self.event_factory();
        if !closed.is_empty() {
            self.uncombine_locked(&closed, &*factory);
        }
        if !opened.is_empty() {
            self.combine_locked(&opened, &*factory);
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn room_graph(&self) -> RoomGraph {
        RoomGraph::new(self.registry.rooms())
    }

    fn event_factory(&self) -> SharedFactory {
        Arc::clone(
            &self
                .event_factory
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn publish(&self, event: Event) {
        let _ = self.publisher.publish(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sequence(&self) -> MutexGuard<'_, ()> {
        self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<ControlEvent>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

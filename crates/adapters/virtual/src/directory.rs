//! Directory of virtual partition controls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use roomjoin_app::ports::{ControlDirectory, PartitionControl};
use roomjoin_domain::id::ControlId;

use crate::control::VirtualPartitionControl;

/// Controls indexed by id, shared with whoever simulates them.
#[derive(Default)]
pub struct InMemoryControlDirectory {
    controls: Mutex<HashMap<ControlId, Arc<VirtualPartitionControl>>>,
}

impl InMemoryControlDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a control, replacing any control with the same id.
    pub fn insert(&self, control: Arc<VirtualPartitionControl>) {
        self.lock().insert(control.id(), control);
    }

    #[must_use]
    pub fn control(&self, id: ControlId) -> Option<Arc<VirtualPartitionControl>> {
        self.lock().get(&id).cloned()
    }

    /// First control registered under `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Arc<VirtualPartitionControl>> {
        self.lock()
            .values()
            .find(|control| control.name() == name)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ControlId, Arc<VirtualPartitionControl>>> {
        self.controls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ControlDirectory for InMemoryControlDirectory {
    fn get(&self, id: ControlId) -> Option<Arc<dyn PartitionControl>> {
        self.control(id)
            .map(|control| control as Arc<dyn PartitionControl>)
    }
}

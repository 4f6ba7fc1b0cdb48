//! Enforces the "at most one in-flight event per item" rule (see the
//! concurrency model): a worker must acquire an item before dispatching its
//! event, and release it once the service call completes.

use std::collections::HashSet;
use std::sync::Mutex;

use uuid::Uuid;

/// Tracks which item ids currently have an event being processed.
#[derive(Default)]
pub struct InProgressSet {
    items: Mutex<HashSet<Uuid>>,
}

impl InProgressSet {
    /// Construct an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to claim exclusive in-progress status for `item_id`. Returns
    /// `false` if another worker already holds it.
    #[must_use]
    pub fn try_acquire(&self, item_id: Uuid) -> bool {
        self.lock().insert(item_id)
    }

    /// Release a previously acquired item.
    pub fn release(&self, item_id: Uuid) {
        self.lock().remove(&item_id);
    }

    /// Whether `item_id` currently has an in-flight event.
    #[must_use]
    pub fn contains(&self, item_id: Uuid) -> bool {
        self.lock().contains(&item_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

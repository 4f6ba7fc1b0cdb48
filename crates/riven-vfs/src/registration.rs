//! Drives the VFS host's registration contract from the orchestrator side:
//! dedupes entries by `(infohash, profile_name)`, then re-syncs a leaf's
//! registration exactly rather than incrementally.

use std::collections::HashSet;
use std::sync::Arc;

use riven_events::{Event, EventBus};
use riven_media::MediaItem;

use crate::error::{VfsError, VfsResult};
use crate::host::VfsHost;

/// Registers leaf items with a [`VfsHost`] and publishes the resulting
/// domain events.
pub struct VfsRegistrar {
    host: Arc<dyn VfsHost>,
    events: EventBus,
}

impl VfsRegistrar {
    /// Construct a registrar over `host`, publishing to `events`.
    #[must_use]
    pub fn new(host: Arc<dyn VfsHost>, events: EventBus) -> Self {
        Self { host, events }
    }

    /// Drop duplicate `(infohash, profile_name)` entries from `leaf`,
    /// keeping the first occurrence, then call `remove` followed by `add` on
    /// the host so registration is exact rather than incremental.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the host rejects removal/addition or if the
    /// resulting event could not be published.
    pub fn register_leaf(&self, leaf: &mut MediaItem) -> VfsResult<()> {
        dedup_entries(leaf);

        self.host.remove(leaf)?;
        self.events
            .publish(Event::VfsRemoved { item_id: leaf.id })
            .map_err(|source| VfsError::EventPublish {
                id: leaf.id,
                source,
            })?;

        self.host.add(leaf)?;
        let path_count = leaf
            .filesystem_entries
            .iter()
            .map(|e| e.vfs_paths.len())
            .sum();
        self.events
            .publish(Event::VfsRegistered {
                item_id: leaf.id,
                path_count,
            })
            .map_err(|source| VfsError::EventPublish {
                id: leaf.id,
                source,
            })?;
        Ok(())
    }

    /// Refresh every previously registered leaf's layout, e.g. after a
    /// profile or library path change.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the host could not complete the refresh.
    pub fn sync(&self) -> VfsResult<()> {
        self.host.sync()
    }
}

fn dedup_entries(leaf: &mut MediaItem) {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    leaf.filesystem_entries
        .retain(|entry| seen.insert(entry.dedup_key()));
}

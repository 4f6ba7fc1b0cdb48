//! Retention Enforcer: after every Download Orchestrator pass, trims each
//! item's `filesystem_entries` down to `keep_versions` per ranking profile.

use std::collections::{HashMap, HashSet};

use riven_events::{Event, EventBus};
use riven_media::MediaItem;

use crate::error::{VfsError, VfsResult};

/// Enforces the per-profile `keep_versions` retention policy.
pub struct RetentionEnforcer {
    events: EventBus,
}

impl RetentionEnforcer {
    /// Construct an enforcer publishing to `events`.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Group `item.filesystem_entries` by `profile_name` and, within each
    /// group, keep at most `keep_versions(profile)` entries ordered by
    /// `desired` position first, then by the entry's rank position in
    /// `item.streams`. Drops the rest and retargets `active_stream` to the
    /// top retained entry when its previous target was dropped.
    ///
    /// Returns the number of entries dropped.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the resulting event could not be published.
    pub fn enforce(
        &self,
        item: &mut MediaItem,
        desired: &[String],
        keep_versions: impl Fn(&str) -> u32,
    ) -> VfsResult<usize> {
        let stream_rank: HashMap<String, usize> = item
            .streams
            .iter()
            .enumerate()
            .map(|(rank_pos, stream)| (stream.infohash().to_string(), rank_pos))
            .collect();

        let mut by_profile: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in item.filesystem_entries.iter().enumerate() {
            by_profile
                .entry(entry.media_metadata.profile_name.clone())
                .or_default()
                .push(idx);
        }

        let mut keep: HashSet<usize> = HashSet::new();
        for (profile, mut indices) in by_profile {
            let cap = keep_versions(&profile) as usize;
            indices.sort_by_key(|&idx| {
                let entry = &item.filesystem_entries[idx];
                let desired_pos = desired
                    .iter()
                    .position(|hash| hash == &entry.infohash)
                    .unwrap_or(usize::MAX);
                let rank_pos = stream_rank
                    .get(&entry.infohash)
                    .copied()
                    .unwrap_or(usize::MAX);
                (desired_pos, rank_pos, idx)
            });
            keep.extend(indices.into_iter().take(cap));
        }

        let total_before = item.filesystem_entries.len();
        let mut retained = Vec::with_capacity(keep.len());
        for (idx, entry) in item.filesystem_entries.drain(..).enumerate() {
            if keep.contains(&idx) {
                retained.push(entry);
            }
        }
        let dropped = total_before - retained.len();

        if let Some(active) = &item.active_stream {
            let still_present = retained.iter().any(|e| e.infohash == active.infohash);
            if !still_present {
                item.active_stream = retained.first().map(|top| riven_media::ActiveStream {
                    infohash: top.infohash.clone(),
                    provider_torrent_id: top.provider_download_id.clone(),
                });
            }
        }
        item.filesystem_entries = retained;

        if dropped > 0 {
            self.events
                .publish(Event::RetentionEnforced {
                    item_id: item.id,
                    dropped,
                })
                .map_err(|source| VfsError::EventPublish {
                    id: item.id,
                    source,
                })?;
        }

        Ok(dropped)
    }
}

//! The VFS host contract and an in-memory implementation used for wiring and
//! tests.
//!
//! Path materialization, `readdir`, and `open` belong to the real FUSE/VFS
//! host process, which lives outside this workspace and is treated as an
//! external collaborator specified only by the contract below. What this
//! module owns is the client side: deriving a virtual path per entry from
//! `media_metadata` and the library profile layout, and registering it with
//! whatever host implements [`VfsHost`].

use std::collections::HashMap;
use std::sync::RwLock;

use riven_media::{ItemKind, MediaEntry, MediaItem};
use uuid::Uuid;

use crate::error::VfsResult;

/// Derives the virtual path for one `MediaEntry` under a library profile.
///
/// Implementations see only the leaf's identity (title, year, kind) and the
/// entry being registered; per the registration contract, path generation is
/// a pure function of `media_metadata` and the profile layout, never of
/// sibling state.
pub trait PathBuilder: Send + Sync {
    /// Build the virtual path for `entry`, owned by a leaf titled
    /// `leaf_title` (released in `leaf_year`) of variant `leaf_kind`.
    fn build(
        &self,
        leaf_title: &str,
        leaf_year: Option<i32>,
        leaf_kind: ItemKind,
        entry: &MediaEntry,
    ) -> String;
}

/// Plex-style layout: `{profile}/{title} ({year})/Season {NN}/{filename}` for
/// episodic content, `{profile}/{title} ({year})/{filename}` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryPathBuilder;

impl PathBuilder for LibraryPathBuilder {
    fn build(
        &self,
        leaf_title: &str,
        leaf_year: Option<i32>,
        leaf_kind: ItemKind,
        entry: &MediaEntry,
    ) -> String {
        let year_suffix = leaf_year.map_or_else(String::new, |year| format!(" ({year})"));
        let title_dir = format!("{leaf_title}{year_suffix}");
        let profile = &entry.media_metadata.profile_name;
        let filename = &entry.original_filename;

        if leaf_kind == ItemKind::Episode {
            let season = entry
                .media_metadata
                .parsed
                .seasons
                .first()
                .copied()
                .unwrap_or(0);
            format!("{profile}/{title_dir}/Season {season:02}/{filename}")
        } else {
            format!("{profile}/{title_dir}/{filename}")
        }
    }
}

/// Contract exposed by the VFS host.
///
/// `add` and `remove` operate on one leaf at a time; `sync` is a host-wide
/// refresh invoked after a settings or profile change, re-deriving every
/// previously registered leaf's paths against the current layout.
pub trait VfsHost: Send + Sync {
    /// Re-derive a virtual path per entry in `leaf.filesystem_entries` and
    /// register them so opens are served by streaming from `download_url`.
    /// Writes the derived paths back into each entry's `vfs_paths`. Returns
    /// whether any path was registered.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::VfsError`] if the host could not complete
    /// registration.
    fn add(&self, leaf: &mut MediaItem) -> VfsResult<bool>;

    /// Unregister `leaf`'s paths and clear `vfs_paths` on its entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::VfsError`] if the host could not complete
    /// unregistration.
    fn remove(&self, leaf: &mut MediaItem) -> VfsResult<()>;

    /// Refresh every previously registered leaf's layout, e.g. after a
    /// profile or `library_profiles` change.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::VfsError`] if the host could not complete the
    /// refresh.
    fn sync(&self) -> VfsResult<()>;
}

/// An in-process `VfsHost` backed by a `HashMap`, used for wiring the
/// pipeline and in integration tests. Retains a clone of every registered
/// leaf so `sync` can recompute paths without the caller re-supplying them.
pub struct InMemoryVfsHost {
    registry: RwLock<HashMap<Uuid, MediaItem>>,
    path_builder: Box<dyn PathBuilder>,
}

impl InMemoryVfsHost {
    /// Construct a host using the default library layout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path_builder(Box::new(LibraryPathBuilder))
    }

    /// Construct a host using a custom path layout.
    #[must_use]
    pub fn with_path_builder(path_builder: Box<dyn PathBuilder>) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            path_builder,
        }
    }

    /// Snapshot of the ids currently registered with this host.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<Uuid> {
        self.registry
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn derive_paths(&self, leaf: &mut MediaItem) -> bool {
        let mut changed = false;
        let title = leaf.title.clone();
        let year = leaf.year;
        let kind = leaf.kind;
        for entry in &mut leaf.filesystem_entries {
            let path = self.path_builder.build(&title, year, kind, entry);
            if entry.vfs_paths != vec![path.clone()] {
                changed = true;
            }
            entry.vfs_paths = vec![path];
        }
        changed
    }
}

impl Default for InMemoryVfsHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VfsHost for InMemoryVfsHost {
    fn add(&self, leaf: &mut MediaItem) -> VfsResult<bool> {
        if leaf.filesystem_entries.is_empty() {
            return Ok(false);
        }
        let changed = self.derive_paths(leaf);
        self.registry
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(leaf.id, leaf.clone());
        Ok(changed)
    }

    fn remove(&self, leaf: &mut MediaItem) -> VfsResult<()> {
        self.registry
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&leaf.id);
        for entry in &mut leaf.filesystem_entries {
            entry.vfs_paths.clear();
        }
        Ok(())
    }

    fn sync(&self) -> VfsResult<()> {
        let mut guard = self
            .registry
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for leaf in guard.values_mut() {
            self.derive_paths(leaf);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_media::{MediaEntry, MediaMetadata, ParsedData};

    fn leaf_with_entry(kind: ItemKind, season: Vec<u32>) -> MediaItem {
        let entry = MediaEntry {
            id: Uuid::new_v4(),
            original_filename: "episode.mkv".into(),
            download_url: "https://example.invalid/f".into(),
            provider: "realdebrid".into(),
            provider_download_id: "1".into(),
            file_size: 10,
            infohash: "a".repeat(40),
            media_metadata: MediaMetadata {
                parsed: ParsedData {
                    seasons: season,
                    ..ParsedData::default()
                },
                profile_name: "default".into(),
            },
            library_profiles: vec!["default".into()],
            vfs_paths: vec![],
        };
        MediaItem {
            kind,
            number: Some(3),
            filesystem_entries: vec![entry],
            ..riven_test_support::fixtures::movie_item("Example Show", Some(2020), None)
        }
    }

    #[test]
    fn add_derives_season_scoped_path_for_episodes() {
        let host = InMemoryVfsHost::new();
        let mut leaf = leaf_with_entry(ItemKind::Episode, vec![2]);
        let changed = host.add(&mut leaf).unwrap();
        assert!(changed);
        assert_eq!(
            leaf.filesystem_entries[0].vfs_paths,
            vec!["default/Example Show (2020)/Season 02/episode.mkv".to_string()]
        );
    }

    #[test]
    fn add_is_flat_for_movies() {
        let host = InMemoryVfsHost::new();
        let mut leaf = leaf_with_entry(ItemKind::Movie, vec![]);
        host.add(&mut leaf).unwrap();
        assert_eq!(
            leaf.filesystem_entries[0].vfs_paths,
            vec!["default/Example Show (2020)/episode.mkv".to_string()]
        );
    }

    #[test]
    fn remove_clears_paths_and_unregisters() {
        let host = InMemoryVfsHost::new();
        let mut leaf = leaf_with_entry(ItemKind::Movie, vec![]);
        host.add(&mut leaf).unwrap();
        host.remove(&mut leaf).unwrap();
        assert!(leaf.filesystem_entries[0].vfs_paths.is_empty());
        assert!(host.registered_ids().is_empty());
    }

    #[test]
    fn add_on_leaf_with_no_entries_is_a_noop() {
        let host = InMemoryVfsHost::new();
        let mut leaf = leaf_with_entry(ItemKind::Movie, vec![]);
        leaf.filesystem_entries.clear();
        assert!(!host.add(&mut leaf).unwrap());
        assert!(host.registered_ids().is_empty());
    }

    #[test]
    fn sync_recomputes_paths_for_every_registered_leaf() {
        let host = InMemoryVfsHost::new();
        let mut leaf = leaf_with_entry(ItemKind::Episode, vec![1]);
        host.add(&mut leaf).unwrap();
        host.sync().unwrap();
        assert_eq!(host.registered_ids(), vec![leaf.id]);
    }
}

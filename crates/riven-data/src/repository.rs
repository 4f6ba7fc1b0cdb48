//! The in-memory item tree: the only place a `MediaItem`'s children,
//! parent, or external-id uniqueness are resolved.
//!
//! Persistence (SQL schema, migrations) is explicitly out of scope; this
//! repository is the runtime's sole source of truth for one process
//! lifetime. Parent/child relations are arena-style: children reference
//! their parent by id, never the reverse, so there are no cycles to guard
//! against.

use std::collections::HashMap;
use std::sync::RwLock;

use riven_media::{ExternalIds, ItemKind, MediaItem};
use uuid::Uuid;

use crate::error::{DataError, Result};

/// Thread-safe in-memory store of `MediaItem`s, keyed by id.
#[derive(Default)]
pub struct ItemRepository {
    items: RwLock<HashMap<Uuid, MediaItem>>,
}

impl ItemRepository {
    /// Construct an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, MediaItem>> {
        self.items.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, MediaItem>> {
        self.items.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Insert a new item, rejecting it if its external identifiers are
    /// already claimed by another item (the duplicate-item race in the
    /// error-handling taxonomy: callers should merge into the existing item
    /// instead of retrying the insert).
    ///
    /// # Errors
    ///
    /// Returns [`DataError::DuplicateExternalId`] if any of `imdb_id`,
    /// `tmdb_id`, `tvdb_id` already belongs to a different item.
    pub fn insert(&self, item: MediaItem) -> Result<Uuid> {
        let mut guard = self.write();
        if let Some(existing_id) = Self::find_by_external_ids(&guard, &item.external_ids) {
            if existing_id != item.id {
                return Err(DataError::DuplicateExternalId { existing_id });
            }
        }
        let id = item.id;
        guard.insert(id, item);
        Ok(id)
    }

    /// Fetch a clone of the item with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ItemNotFound`] if no such item exists.
    pub fn get(&self, id: Uuid) -> Result<MediaItem> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or(DataError::ItemNotFound { id })
    }

    /// Apply `mutator` to the stored item in place.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ItemNotFound`] if no such item exists.
    pub fn update(&self, id: Uuid, mutator: impl FnOnce(&mut MediaItem)) -> Result<()> {
        let mut guard = self.write();
        let item = guard.get_mut(&id).ok_or(DataError::ItemNotFound { id })?;
        mutator(item);
        Ok(())
    }

    /// Remove and return an item.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ItemNotFound`] if no such item exists.
    pub fn remove(&self, id: Uuid) -> Result<MediaItem> {
        self.write().remove(&id).ok_or(DataError::ItemNotFound { id })
    }

    /// All direct children of `parent_id`, sorted by `number`.
    #[must_use]
    pub fn children_of(&self, parent_id: Uuid) -> Vec<MediaItem> {
        let mut children: Vec<MediaItem> = self
            .read()
            .values()
            .filter(|item| item.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(|item| item.number.unwrap_or(0));
        children
    }

    /// Find an existing item by any of `ids`'s non-empty identifiers.
    #[must_use]
    pub fn find_by_external_id(&self, ids: &ExternalIds) -> Option<Uuid> {
        Self::find_by_external_ids(&self.read(), ids)
    }

    fn find_by_external_ids(items: &HashMap<Uuid, MediaItem>, ids: &ExternalIds) -> Option<Uuid> {
        if ids.is_empty() {
            return None;
        }
        items
            .values()
            .find(|item| {
                (ids.imdb_id.is_some() && item.external_ids.imdb_id == ids.imdb_id)
                    || (ids.tmdb_id.is_some() && item.external_ids.tmdb_id == ids.tmdb_id)
                    || (ids.tvdb_id.is_some() && item.external_ids.tvdb_id == ids.tvdb_id)
            })
            .map(|item| item.id)
    }

    /// Resolve an episode number (relative to `season_number`, or absolute
    /// for anime) to a concrete Episode item under `show_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ItemNotFound`] if `show_id` does not name a Show.
    pub fn get_absolute_episode(
        &self,
        show_id: Uuid,
        episode_number: u32,
        season_number: Option<u32>,
    ) -> Result<Option<Uuid>> {
        let show = self.get(show_id)?;
        let seasons = self.children_of(show_id);
        if show.is_anime {
            for season in &seasons {
                if let Some(episode) = self
                    .children_of(season.id)
                    .into_iter()
                    .find(|e| e.absolute_number == Some(episode_number))
                {
                    return Ok(Some(episode.id));
                }
            }
        }
        let Some(season_number) = season_number else {
            return Ok(None);
        };
        let Some(season) = seasons.into_iter().find(|s| s.number == Some(season_number)) else {
            return Ok(None);
        };
        Ok(self
            .children_of(season.id)
            .into_iter()
            .find(|e| e.number == Some(episode_number))
            .map(|e| e.id))
    }

    /// The episode-count cap used to reject implausible episode numbers
    /// during file-to-item matching: `max(total episode count across
    /// seasons, last-season's last-episode number)`.
    ///
    /// This mirrors a formula flagged as an explicit, possibly-lossy policy
    /// knob rather than ground truth: non-contiguous episode numbering can
    /// make it over- or under-count.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ItemNotFound`] if `show_id` does not name a Show,
    /// or [`DataError::NotALeaf`] if it does not name a `Show`.
    pub fn episode_cap(&self, show_id: Uuid) -> Result<u32> {
        let show = self.get(show_id)?;
        if show.kind != ItemKind::Show {
            return Err(DataError::NotALeaf { id: show_id });
        }
        let mut seasons = self.children_of(show_id);
        seasons.sort_by_key(|s| s.number.unwrap_or(0));
        let total_episodes: u32 = seasons
            .iter()
            .map(|season| self.children_of(season.id).len() as u32)
            .sum();
        let last_season_last_episode = seasons
            .last()
            .map(|season| {
                self.children_of(season.id)
                    .iter()
                    .filter_map(|e| e.number)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        Ok(total_episodes.max(last_season_last_episode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_media::{Aliases, ExternalIds};
    use std::collections::HashSet;

    fn show(id: Uuid, imdb: &str) -> MediaItem {
        MediaItem {
            id,
            kind: ItemKind::Show,
            external_ids: ExternalIds {
                imdb_id: Some(imdb.to_string()),
                ..ExternalIds::default()
            },
            title: "Show".into(),
            year: None,
            aired_at: None,
            country: None,
            is_anime: false,
            parent_id: None,
            number: None,
            absolute_number: None,
            streams: vec![],
            blacklisted_streams: HashSet::new(),
            active_stream: None,
            filesystem_entries: vec![],
            aliases: Aliases::default(),
            scraped_at: None,
        }
    }

    fn season(id: Uuid, parent: Uuid, number: u32) -> MediaItem {
        let mut item = show(id, "");
        item.external_ids = ExternalIds::default();
        item.kind = ItemKind::Season;
        item.parent_id = Some(parent);
        item.number = Some(number);
        item
    }

    fn episode(id: Uuid, parent: Uuid, number: u32, absolute: Option<u32>) -> MediaItem {
        let mut item = show(id, "");
        item.external_ids = ExternalIds::default();
        item.kind = ItemKind::Episode;
        item.parent_id = Some(parent);
        item.number = Some(number);
        item.absolute_number = absolute;
        item
    }

    #[test]
    fn duplicate_imdb_id_is_rejected_on_insert() {
        let repo = ItemRepository::new();
        let show_id = Uuid::new_v4();
        repo.insert(show(show_id, "tt1")).unwrap();
        let err = repo.insert(show(Uuid::new_v4(), "tt1")).unwrap_err();
        assert_eq!(err, DataError::DuplicateExternalId { existing_id: show_id });
    }

    #[test]
    fn children_of_returns_sorted_by_number() {
        let repo = ItemRepository::new();
        let show_id = Uuid::new_v4();
        repo.insert(show(show_id, "tt1")).unwrap();
        let s2 = Uuid::new_v4();
        let s1 = Uuid::new_v4();
        repo.insert(season(s2, show_id, 2)).unwrap();
        repo.insert(season(s1, show_id, 1)).unwrap();
        let children = repo.children_of(show_id);
        assert_eq!(children.iter().map(|c| c.number).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn get_absolute_episode_resolves_by_season_and_number_for_non_anime() {
        let repo = ItemRepository::new();
        let show_id = Uuid::new_v4();
        repo.insert(show(show_id, "tt1")).unwrap();
        let season_id = Uuid::new_v4();
        repo.insert(season(season_id, show_id, 1)).unwrap();
        let episode_id = Uuid::new_v4();
        repo.insert(episode(episode_id, season_id, 5, None)).unwrap();

        let found = repo.get_absolute_episode(show_id, 5, Some(1)).unwrap();
        assert_eq!(found, Some(episode_id));
    }

    #[test]
    fn get_absolute_episode_honors_absolute_numbering_for_anime() {
        let repo = ItemRepository::new();
        let show_id = Uuid::new_v4();
        let mut anime_show = show(show_id, "tt2");
        anime_show.is_anime = true;
        repo.insert(anime_show).unwrap();
        let season_id = Uuid::new_v4();
        repo.insert(season(season_id, show_id, 1)).unwrap();
        let episode_id = Uuid::new_v4();
        repo.insert(episode(episode_id, season_id, 1, Some(42))).unwrap();

        let found = repo.get_absolute_episode(show_id, 42, None).unwrap();
        assert_eq!(found, Some(episode_id));
    }

    #[test]
    fn episode_cap_is_max_of_total_and_last_season_last_episode() {
        let repo = ItemRepository::new();
        let show_id = Uuid::new_v4();
        repo.insert(show(show_id, "tt3")).unwrap();
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        repo.insert(season(s1, show_id, 1)).unwrap();
        repo.insert(season(s2, show_id, 2)).unwrap();
        for n in 1..=10 {
            repo.insert(episode(Uuid::new_v4(), s1, n, None)).unwrap();
        }
        for n in 1..=3 {
            repo.insert(episode(Uuid::new_v4(), s2, n, None)).unwrap();
        }
        assert_eq!(repo.episode_cap(show_id).unwrap(), 13);
    }
}

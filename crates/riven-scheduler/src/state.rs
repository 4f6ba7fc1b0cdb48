//! Derives an item's lifecycle state from its current attributes. States are
//! never stored: they are recomputed on every dispatch from the repository.

use chrono::{DateTime, Utc};
use riven_data::ItemRepository;
use riven_events::ItemState;
use riven_media::MediaItem;
use uuid::Uuid;

use crate::error::SchedulerResult;

const PAUSED_KEY: &str = "paused";
pub(crate) const FAILED_REASON_KEY: &str = "failed_reason";

/// Derive the current state of `item_id`, folding over its children when it
/// is a Show or Season.
///
/// # Errors
///
/// Returns an error if `item_id`, or any of its descendants, cannot be
/// resolved in `repo`.
pub fn derive_state(repo: &ItemRepository, item_id: Uuid, now: DateTime<Utc>) -> SchedulerResult<ItemState> {
    let item = repo.get(item_id)?;
    let children = repo.children_of(item_id);
    if children.is_empty() {
        return Ok(derive_leaf(&item, now));
    }
    let mut child_states = Vec::with_capacity(children.len());
    for child in &children {
        child_states.push(derive_state(repo, child.id, now)?);
    }
    Ok(fold(&child_states))
}

/// Derive the state of a single item from its own attributes, ignoring any
/// children. Used directly for Movie/Episode leaves, and as the fallback for
/// a childless Show/Season.
#[must_use]
pub fn derive_leaf(item: &MediaItem, now: DateTime<Utc>) -> ItemState {
    if matches!(item.aliases.extra.get(PAUSED_KEY), Some(value) if value.as_bool() == Some(true)) {
        return ItemState::Paused;
    }
    if item.aliases.extra.get(FAILED_REASON_KEY).is_some() {
        return ItemState::Failed;
    }
    if item.title.trim().is_empty() {
        return ItemState::Unknown;
    }
    if item.external_ids.is_empty() {
        return ItemState::Requested;
    }
    if item.aired_at.is_some_and(|aired_at| aired_at > now) {
        return ItemState::Unreleased;
    }
    if !item.has_scraped_streams() {
        return ItemState::Indexed;
    }
    if item.filesystem_entries.is_empty() {
        return ItemState::Scraped;
    }
    if !item.has_symlinked_entry() {
        return ItemState::Downloaded;
    }
    ItemState::Completed
}

/// Fold a set of child states into their parent's derived state.
///
/// - All children `Completed` -> `Completed`.
/// - All children `Completed` or `Failed`, with at least one `Failed` -> `Failed`.
/// - All children `Completed` or `Unreleased` -> `Ongoing` (still airing).
/// - All children `Paused` -> `Paused`.
/// - Otherwise, the least-advanced state among children still on the core
///   ladder (`Unknown`..`Symlinked`): the parent is only as done as its
///   slowest leaf.
#[must_use]
pub fn fold(children: &[ItemState]) -> ItemState {
    if children.is_empty() {
        return ItemState::Indexed;
    }
    if children.iter().all(|state| *state == ItemState::Completed) {
        return ItemState::Completed;
    }
    if children.iter().all(|state| matches!(state, ItemState::Completed | ItemState::Failed))
        && children.iter().any(|state| *state == ItemState::Failed)
    {
        return ItemState::Failed;
    }
    if children.iter().all(|state| matches!(state, ItemState::Completed | ItemState::Unreleased)) {
        return ItemState::Ongoing;
    }
    if children.iter().all(|state| *state == ItemState::Paused) {
        return ItemState::Paused;
    }
    children
        .iter()
        .filter(|state| {
            !matches!(
                state,
                ItemState::Completed | ItemState::Failed | ItemState::Paused | ItemState::Unreleased
            )
        })
        .map(|state| stage_rank(*state))
        .min()
        .map_or(ItemState::Ongoing, state_for_rank)
}

const fn stage_rank(state: ItemState) -> u8 {
    match state {
        ItemState::Unknown => 0,
        ItemState::Requested => 1,
        ItemState::Indexed => 2,
        ItemState::Scraped => 3,
        ItemState::Downloaded => 4,
        ItemState::Symlinked => 5,
        _ => 6,
    }
}

const fn state_for_rank(rank: u8) -> ItemState {
    match rank {
        0 => ItemState::Unknown,
        1 => ItemState::Requested,
        2 => ItemState::Indexed,
        3 => ItemState::Scraped,
        4 => ItemState::Downloaded,
        _ => ItemState::Symlinked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_media::ExternalIds;

    fn leaf(title: &str, external: bool, aired_in_future: bool) -> MediaItem {
        let imdb_id = external.then_some("tt1");
        MediaItem {
            aired_at: aired_in_future.then(|| Utc::now() + chrono::Duration::days(30)),
            ..riven_test_support::fixtures::movie_item(title, None, imdb_id)
        }
    }

    #[test]
    fn item_with_no_title_is_unknown() {
        assert_eq!(derive_leaf(&leaf("", false, false), Utc::now()), ItemState::Unknown);
    }

    #[test]
    fn item_without_external_ids_is_requested() {
        assert_eq!(derive_leaf(&leaf("Title", false, false), Utc::now()), ItemState::Requested);
    }

    #[test]
    fn future_air_date_is_unreleased() {
        assert_eq!(derive_leaf(&leaf("Title", true, true), Utc::now()), ItemState::Unreleased);
    }

    #[test]
    fn indexed_item_with_no_streams() {
        assert_eq!(derive_leaf(&leaf("Title", true, false), Utc::now()), ItemState::Indexed);
    }

    #[test]
    fn paused_flag_wins_over_everything_else() {
        let mut item = leaf("Title", true, false);
        item.aliases.extra.insert(PAUSED_KEY.to_string(), serde_json::Value::Bool(true));
        assert_eq!(derive_leaf(&item, Utc::now()), ItemState::Paused);
    }

    #[test]
    fn fold_all_completed_is_completed() {
        let states = vec![ItemState::Completed, ItemState::Completed];
        assert_eq!(fold(&states), ItemState::Completed);
    }

    #[test]
    fn fold_any_failed_among_otherwise_terminal_is_failed() {
        let states = vec![ItemState::Completed, ItemState::Failed];
        assert_eq!(fold(&states), ItemState::Failed);
    }

    #[test]
    fn fold_completed_and_unreleased_is_ongoing() {
        let states = vec![ItemState::Completed, ItemState::Unreleased];
        assert_eq!(fold(&states), ItemState::Ongoing);
    }

    #[test]
    fn fold_reports_least_advanced_non_terminal_child() {
        let states = vec![ItemState::Completed, ItemState::Indexed, ItemState::Scraped];
        assert_eq!(fold(&states), ItemState::Indexed);
    }

    #[test]
    fn derive_state_recurses_into_children() {
        let repo = ItemRepository::new();
        let mut show = leaf("Show", true, false);
        show.kind = ItemKind::Show;
        let show_id = show.id;
        repo.insert(show).unwrap();

        let mut season = leaf("Season 1", false, false);
        season.external_ids = ExternalIds::default();
        season.kind = ItemKind::Season;
        season.parent_id = Some(show_id);
        season.number = Some(1);
        let season_id = season.id;
        repo.insert(season).unwrap();

        let mut episode = leaf("Episode 1", false, false);
        episode.external_ids = ExternalIds::default();
        episode.kind = ItemKind::Episode;
        episode.parent_id = Some(season_id);
        episode.number = Some(1);
        repo.insert(episode).unwrap();

        // Episode has no external ids of its own: Requested.
        let state = derive_state(&repo, show_id, Utc::now()).unwrap();
        assert_eq!(state, ItemState::Requested);
    }
}

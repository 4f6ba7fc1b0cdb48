//! Maps a derived state to the next pipeline stage, per the fixed routing
//! table: `Requested -> Indexer -> Scraper -> Downloader -> Filesystem ->
//! PostProcessing -> Completed`.

use riven_events::ItemState;

/// The stage name the event manager should dispatch to next, or `None` if
/// the item requires no further processing this round.
#[must_use]
pub const fn next_stage(state: ItemState) -> Option<&'static str> {
    match state {
        ItemState::Requested => Some("indexer"),
        ItemState::Indexed => Some("scraper"),
        ItemState::Scraped => Some("downloader"),
        ItemState::Downloaded => Some("filesystem"),
        ItemState::Symlinked => Some("postprocessing"),
        ItemState::Unknown
        | ItemState::Completed
        | ItemState::Failed
        | ItemState::Paused
        | ItemState::Ongoing
        | ItemState::Unreleased => None,
    }
}

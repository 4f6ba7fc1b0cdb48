//! The metadata-provider seam the validator queries for expected episode
//! counts. Concrete TMDB/TVDB/Trakt clients live outside this crate; they
//! are pure `id -> record` functions from the pipeline's perspective.

use async_trait::async_trait;
use riven_media::MediaItem;

/// Reports how many episodes a metadata provider (TMDB/TVDB/etc.) expects
/// for a given show/season.
#[async_trait]
pub trait EpisodeCountProvider: Send + Sync {
    /// Expected episode count for `season` within `show`, per the metadata
    /// provider's current record.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message on lookup failure; the caller
    /// surfaces this as [`crate::error::PostprocessError::Metadata`].
    async fn expected_episode_count(&self, show: &MediaItem, season: &MediaItem) -> Result<u32, String>;
}

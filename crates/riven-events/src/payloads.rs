//! Event payload types carried across the acquisition pipeline.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier assigned to each event emitted by the platform.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Derived lifecycle state of a [`MediaItem`](https://docs.rs/riven-media), computed
/// from its attributes rather than stored. See the state machine component design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// No identifiers and no metadata yet.
    Unknown,
    /// Created by a content source, awaiting indexing.
    Requested,
    /// Has external identifiers and metadata.
    Indexed,
    /// Has at least one non-blacklisted stream.
    Scraped,
    /// Has at least one filesystem entry.
    Downloaded,
    /// An entry is visible under the library path.
    Symlinked,
    /// Symlinked for every required leaf.
    Completed,
    /// Terminal failure state.
    Failed,
    /// Administratively paused.
    Paused,
    /// A season/show still airing.
    Ongoing,
    /// Not yet aired.
    Unreleased,
}

impl ItemState {
    /// Whether the item still requires further processing by some service.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Paused)
    }
}

/// Typed domain events surfaced across the acquisition pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A media item was created by a content source.
    ItemCreated {
        /// Identifier of the item that was created.
        item_id: Uuid,
        /// Content source that created it.
        source: String,
    },
    /// An item's derived state changed.
    ItemStateChanged {
        /// Identifier of the item whose state changed.
        item_id: Uuid,
        /// Previous derived state, if known.
        previous: Option<ItemState>,
        /// New derived state.
        state: ItemState,
    },
    /// The scraper fan-in finished ranking streams for an item.
    StreamsRanked {
        /// Identifier of the item that was scraped.
        item_id: Uuid,
        /// Number of streams selected across all profiles.
        stream_count: usize,
    },
    /// A stream was blacklisted and will never be retried for this item.
    StreamBlacklisted {
        /// Identifier of the item owning the stream.
        item_id: Uuid,
        /// Infohash that was blacklisted.
        infohash: String,
    },
    /// The download orchestrator began processing an item's streams.
    DownloadStarted {
        /// Identifier of the item being downloaded.
        item_id: Uuid,
    },
    /// A debrid provider entered circuit-breaker cooldown.
    ProviderCooldown {
        /// Name of the provider that opened its circuit breaker.
        provider: String,
        /// Timestamp after which the provider may be retried.
        until: DateTime<Utc>,
    },
    /// A new filesystem entry (`MediaEntry`) was materialized.
    MediaEntryCreated {
        /// Identifier of the leaf item that owns the entry.
        item_id: Uuid,
        /// Infohash of the entry's source torrent.
        infohash: String,
        /// Ranking profile the entry was materialized for.
        profile_name: String,
    },
    /// The VFS host finished registering a leaf item's entries.
    VfsRegistered {
        /// Identifier of the leaf item that was registered.
        item_id: Uuid,
        /// Number of virtual paths produced.
        path_count: usize,
    },
    /// The VFS host unregistered a leaf item's entries.
    VfsRemoved {
        /// Identifier of the leaf item that was unregistered.
        item_id: Uuid,
    },
    /// The retention enforcer dropped entries to satisfy `keep_versions`.
    RetentionEnforced {
        /// Identifier of the item that was enforced.
        item_id: Uuid,
        /// Number of entries dropped.
        dropped: usize,
    },
    /// The episode validator detected a gap in a season.
    EpisodeGapDetected {
        /// Identifier of the season that has missing episodes.
        season_id: Uuid,
        /// Episode numbers missing from the season.
        missing_episodes: Vec<u32>,
    },
    /// An item transitioned to the terminal Failed state.
    ItemFailed {
        /// Identifier of the item that failed.
        item_id: Uuid,
        /// Human-readable terminal reason.
        reason: String,
    },
    /// Configuration update was applied.
    SettingsChanged {
        /// Description of the applied configuration change.
        description: String,
    },
    /// System health status changed (degraded or restored components).
    HealthChanged {
        /// Components currently considered degraded.
        degraded: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator, used as a log field and SSE event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ItemCreated { .. } => "item_created",
            Self::ItemStateChanged { .. } => "item_state_changed",
            Self::StreamsRanked { .. } => "streams_ranked",
            Self::StreamBlacklisted { .. } => "stream_blacklisted",
            Self::DownloadStarted { .. } => "download_started",
            Self::ProviderCooldown { .. } => "provider_cooldown",
            Self::MediaEntryCreated { .. } => "media_entry_created",
            Self::VfsRegistered { .. } => "vfs_registered",
            Self::VfsRemoved { .. } => "vfs_removed",
            Self::RetentionEnforced { .. } => "retention_enforced",
            Self::EpisodeGapDetected { .. } => "episode_gap_detected",
            Self::ItemFailed { .. } => "item_failed",
            Self::SettingsChanged { .. } => "settings_changed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}

/// An event paired with its assigned id and publish time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned at publish time.
    pub id: EventId,
    /// Wall-clock time the event was published.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds_cover_all_variants() {
        let id = Uuid::nil();
        let samples = vec![
            Event::ItemCreated {
                item_id: id,
                source: "watchlist".into(),
            },
            Event::ItemStateChanged {
                item_id: id,
                previous: Some(ItemState::Requested),
                state: ItemState::Indexed,
            },
            Event::StreamsRanked {
                item_id: id,
                stream_count: 3,
            },
            Event::HealthChanged { degraded: vec![] },
        ];
        for event in samples {
            assert!(!event.kind().is_empty());
        }
    }

    #[test]
    fn terminal_states_are_marked() {
        assert!(ItemState::Completed.is_terminal());
        assert!(ItemState::Failed.is_terminal());
        assert!(!ItemState::Scraped.is_terminal());
    }
}

//! Error types for the download orchestrator and file-to-item matcher.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for download-crate operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors raised while matching container files to items or driving the
/// per-stream attempt loop.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The item kind cannot own a download (e.g. a bare Show with no
    /// resolvable parent chain to a season/episode).
    #[error("item {id} cannot be resolved to an episodic parent")]
    NotEpisodic {
        /// Id of the item that was rejected.
        id: Uuid,
    },
    /// Underlying repository lookup failed while resolving the show/season
    /// chain for an episodic match.
    #[error(transparent)]
    Data(#[from] riven_data::DataError),
    /// Underlying debrid provider call failed outside the circuit-breaker
    /// and not-cached cases the orchestrator already handles inline.
    #[error(transparent)]
    Debrid(#[from] riven_debrid::DebridError),
    /// Publishing a domain event failed.
    #[error("failed to publish event for item {id}")]
    EventPublish {
        /// Id of the item the event concerned.
        id: Uuid,
        /// Underlying event bus error.
        #[source]
        source: riven_events::EventBusError,
    },
}

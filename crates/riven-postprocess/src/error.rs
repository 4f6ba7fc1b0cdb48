//! Error types for the episode validator.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for postprocess operations.
pub type PostprocessResult<T> = Result<T, PostprocessError>;

/// Errors raised while reconciling a season's episode count.
#[derive(Debug, Error)]
pub enum PostprocessError {
    /// The item passed in is not a Season.
    #[error("item {id} is not a season")]
    NotASeason {
        /// Id of the item that was rejected.
        id: Uuid,
    },
    /// A Season has no parent Show; the object graph is malformed.
    #[error("season {id} has no parent show")]
    OrphanSeason {
        /// Id of the orphaned season.
        id: Uuid,
    },
    /// Underlying repository operation failed.
    #[error(transparent)]
    Data(#[from] riven_data::DataError),
    /// The metadata provider could not report an episode count.
    #[error("metadata provider failed for season {id}: {message}")]
    Metadata {
        /// Id of the season being reconciled.
        id: Uuid,
        /// Human-readable detail.
        message: String,
    },
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

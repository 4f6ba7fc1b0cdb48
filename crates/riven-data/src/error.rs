//! Error types for the in-memory item repository.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the item repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// No item exists with the given id.
    #[error("item {id} not found")]
    ItemNotFound {
        /// Id that was looked up.
        id: Uuid,
    },
    /// The requested item is not a leaf (Movie/Episode) and cannot own
    /// filesystem entries directly.
    #[error("item {id} is not a leaf item")]
    NotALeaf {
        /// Id of the non-leaf item.
        id: Uuid,
    },
    /// A new item's external identifiers collided with an existing item's;
    /// the caller should merge into the existing item instead of inserting.
    #[error("item external ids already claimed by {existing_id}")]
    DuplicateExternalId {
        /// Id of the item that already owns this identifier.
        existing_id: Uuid,
    },
}

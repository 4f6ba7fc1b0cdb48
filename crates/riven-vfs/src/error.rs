//! Error types for VFS registration and retention enforcement.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors raised while registering or retaining a leaf item's entries.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The item is not a leaf (Movie/Episode) and cannot own filesystem
    /// entries directly.
    #[error("item {id} is not a leaf item and cannot own filesystem entries")]
    NotALeaf {
        /// Id of the non-leaf item.
        id: Uuid,
    },
    /// The event bus rejected a registration or retention notification.
    #[error("failed to publish vfs event for item {id}")]
    EventPublish {
        /// Id of the item the event concerned.
        id: Uuid,
        /// Underlying event bus error.
        #[source]
        source: riven_events::EventBusError,
    },
}

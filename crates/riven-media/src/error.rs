//! Error types for the media data model.

use thiserror::Error;
use uuid::Uuid;

/// Primary error type for media model construction and mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// An infohash failed the 40-character lower-hex normalization rule.
    #[error("invalid infohash: {value}")]
    InvalidInfohash {
        /// The rejected value.
        value: String,
    },
    /// A season or episode number was outside its valid range.
    #[error("invalid numbering for {field}: {value}")]
    InvalidNumbering {
        /// Field name (`season` or `episode`).
        field: &'static str,
        /// Rejected value.
        value: i64,
    },
    /// A leaf item does not exist.
    #[error("item not found: {item_id}")]
    ItemNotFound {
        /// Missing item identifier.
        item_id: Uuid,
    },
    /// A non-leaf item was used where only Movie/Episode are valid.
    #[error("item {item_id} is not a leaf (movie or episode)")]
    NotALeaf {
        /// The offending item identifier.
        item_id: Uuid,
    },
    /// An item was constructed without any canonical external identifier.
    #[error("item {item_id} has no external identifier")]
    MissingExternalId {
        /// The offending item identifier.
        item_id: Uuid,
    },
}

/// Convenience alias for media model results.
pub type MediaResult<T> = Result<T, MediaError>;

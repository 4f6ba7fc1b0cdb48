//! Error types for debrid provider operations.

use thiserror::Error;

/// Error surfaced by a debrid provider operation.
///
/// The scheduler boundary never sees these directly: the download
/// orchestrator converts [`DebridError::CircuitBreakerOpen`] into a cooldown
/// re-dispatch and every other variant into either a per-stream failure or a
/// soft item-level failure, per the error handling taxonomy.
#[derive(Debug, Error, Clone)]
pub enum DebridError {
    /// The provider's client has temporarily stopped issuing requests to its
    /// remote after repeated failures. The scheduler treats this as a delay,
    /// not a failure, and never blacklists the stream that triggered it.
    #[error("circuit breaker open for provider {provider}")]
    CircuitBreakerOpen {
        /// Name of the provider whose breaker tripped.
        provider: String,
    },
    /// A transient provider failure (rate limit, 5xx, timeout) short of
    /// tripping the circuit breaker.
    #[error("transient failure from provider {provider}: {message}")]
    Transient {
        /// Name of the provider that failed.
        provider: String,
        /// Human-readable detail.
        message: String,
    },
    /// The provider does not have this infohash cached.
    #[error("infohash not cached by provider {provider}")]
    NotCached {
        /// Name of the provider queried.
        provider: String,
    },
    /// The requested torrent id is unknown to the provider.
    #[error("torrent {torrent_id} not found at provider {provider}")]
    NotFound {
        /// Name of the provider queried.
        provider: String,
        /// Provider-assigned torrent identifier.
        torrent_id: String,
    },
    /// A file within a container could not be parsed (missing size, bad
    /// file id). The caller drops that file and continues with the rest of
    /// the container.
    #[error("invalid file in container from provider {provider}: {reason}")]
    InvalidFile {
        /// Name of the provider that returned the file.
        provider: String,
        /// Human-readable detail.
        reason: String,
    },
}

/// Convenience alias for debrid provider results.
pub type DebridResult<T> = Result<T, DebridError>;

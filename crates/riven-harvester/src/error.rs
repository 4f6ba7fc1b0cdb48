//! Error types for the harvester client.

use thiserror::Error;

/// Result alias for harvester operations.
pub type HarvesterResult<T> = Result<T, HarvesterError>;

/// Errors raised while calling the harvester or resolving its fallback.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// The harvester path is disabled in configuration; callers should treat
    /// this the same as "no new releases" rather than a failure.
    #[error("harvester is disabled")]
    Disabled,
    /// The harvester is unavailable (timeout, connection failure, non-2xx
    /// response). Per the error handling taxonomy this is treated as "no new
    /// releases" by the caller, which still records the attempt.
    #[error("harvester request failed: {0}")]
    Transport(String),
    /// The harvester's response body could not be decoded.
    #[error("harvester response decode failed: {0}")]
    Decode(String),
    /// The rd-library fallback's debrid provider call failed.
    #[error(transparent)]
    Debrid(#[from] riven_debrid::DebridError),
}

//! The seam each pipeline stage (Indexer, Scraper, Downloader, Filesystem,
//! PostProcessing) implements. The event manager owns routing and
//! re-enqueueing; a service only transforms one item and reports what
//! should happen to it next.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riven_media::MediaItem;

/// What a service produced after running an item to completion.
pub enum ServiceOutcome {
    /// Re-enqueue the item immediately for the next stage.
    Advance(MediaItem),
    /// Re-enqueue the item no earlier than the given time (a cooldown).
    Cooldown(MediaItem, DateTime<Utc>),
    /// Re-enqueue each of a batch of items immediately (e.g. episodes
    /// created by a gap-fill pass).
    Fanout(Vec<MediaItem>),
    /// The item needs no further scheduling this round.
    Settled,
}

/// An error raised while a service processes an item.
///
/// `cooldown` names a known retry delay for transient failures (provider
/// circuit breakers, harvester throttling). A `None` cooldown means the
/// failure is treated as fatal: the item routes straight to `Failed` and is
/// not re-enqueued.
#[derive(Debug)]
pub struct ServiceError {
    /// Human-readable failure detail.
    pub message: String,
    /// Retry time for transient failures, `None` for a fatal failure.
    pub cooldown: Option<DateTime<Utc>>,
}

impl ServiceError {
    /// A fatal failure: the item routes to `Failed` and is not retried.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self { message: message.into(), cooldown: None }
    }

    /// A transient failure with a known retry time.
    #[must_use]
    pub fn transient(message: impl Into<String>, retry_at: DateTime<Utc>) -> Self {
        Self { message: message.into(), cooldown: Some(retry_at) }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {}

/// One pipeline stage the scheduler dispatches a ready item to.
#[async_trait]
pub trait Service: Send + Sync {
    /// Stable stage name this service registers under, used for routing and
    /// logging (e.g. `"scraper"`, `"downloader"`).
    fn name(&self) -> &'static str;

    /// Process `item` to completion, yielding its re-enqueue instruction.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the stage could not complete; the caller
    /// decides between a cooldown re-enqueue and routing to `Failed` based on
    /// [`ServiceError::cooldown`].
    async fn run(&self, item: MediaItem) -> Result<ServiceOutcome, ServiceError>;
}

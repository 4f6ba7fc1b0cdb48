//! Downloader service: drives the repo-owning download orchestrator and
//! re-fetches the item afterward to report the scheduler's next step.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use riven_data::ItemRepository;
use riven_download::{DownloadOrchestrator, Outcome};
use riven_media::MediaItem;
use riven_scheduler::{Service, ServiceError, ServiceOutcome};

/// Adapts [`DownloadOrchestrator`] to the scheduler's one-item-in,
/// one-outcome-out service contract. The orchestrator owns the repository
/// mutations itself; this service only re-fetches the result.
pub struct DownloaderService {
    repo: Arc<ItemRepository>,
    orchestrator: DownloadOrchestrator,
    keep_versions: u32,
}

impl DownloaderService {
    /// Construct the adapter. `keep_versions` bounds how many streams the
    /// orchestrator attempts per item in one pass; it is the sum of every
    /// configured ranking profile's `keep_versions_per_item`, so a combined
    /// multi-profile selection is never truncated prematurely.
    #[must_use]
    pub fn new(repo: Arc<ItemRepository>, orchestrator: DownloadOrchestrator, keep_versions: u32) -> Self {
        Self { repo, orchestrator, keep_versions }
    }
}

#[async_trait]
impl Service for DownloaderService {
    fn name(&self) -> &'static str {
        "downloader"
    }

    async fn run(&self, item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        let item_id = item.id;
        let outcome = self
            .orchestrator
            .process_item(item_id, self.keep_versions, |_| {})
            .await
            .map_err(|err| ServiceError::fatal(err.to_string()))?;

        let refreshed = self.repo.get(item_id).map_err(|err| ServiceError::fatal(err.to_string()))?;

        match outcome {
            Outcome::Success => Ok(ServiceOutcome::Advance(refreshed)),
            Outcome::Cooldown { until } => Ok(ServiceOutcome::Cooldown(refreshed, until)),
            Outcome::SoftFailure => {
                Err(ServiceError::transient("no provider could materialize a stream", Utc::now() + Duration::minutes(30)))
            }
        }
    }
}

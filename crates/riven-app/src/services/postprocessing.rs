//! PostProcessing service: reconciles a season's episode count against the
//! metadata provider once its folded state reaches `Symlinked`.

use std::sync::Arc;

use async_trait::async_trait;
use riven_data::ItemRepository;
use riven_media::{ItemKind, MediaItem};
use riven_postprocess::EpisodeValidator;
use riven_scheduler::{Service, ServiceError, ServiceOutcome};

/// Adapts the repo-owning episode validator to the scheduler's service
/// contract. The router only ever dispatches this stage against a Season (a
/// leaf never folds directly to `Symlinked`), but a non-Season item settles
/// without error rather than failing the pipeline.
pub struct PostProcessingService {
    repo: Arc<ItemRepository>,
    validator: EpisodeValidator,
}

impl PostProcessingService {
    /// Construct the adapter over a shared repository and episode validator.
    #[must_use]
    pub fn new(repo: Arc<ItemRepository>, validator: EpisodeValidator) -> Self {
        Self { repo, validator }
    }
}

#[async_trait]
impl Service for PostProcessingService {
    fn name(&self) -> &'static str {
        "postprocessing"
    }

    async fn run(&self, item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        if item.kind != ItemKind::Season {
            return Ok(ServiceOutcome::Settled);
        }

        let reconciled = self.validator.validate_season(item.id).await.map_err(|err| ServiceError::fatal(err.to_string()))?;
        if reconciled.is_empty() {
            return Ok(ServiceOutcome::Settled);
        }

        let mut items = Vec::with_capacity(reconciled.len());
        for episode_id in reconciled {
            items.push(self.repo.get(episode_id).map_err(|err| ServiceError::fatal(err.to_string()))?);
        }
        Ok(ServiceOutcome::Fanout(items))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use riven_events::EventBus;
    use riven_media::{Aliases, ExternalIds};
    use riven_postprocess::EpisodeCountProvider;

    use super::*;

    struct FixedEpisodeCount(u32);

    #[async_trait]
    impl EpisodeCountProvider for FixedEpisodeCount {
        async fn expected_episode_count(&self, _show: &MediaItem, _season: &MediaItem) -> Result<u32, String> {
            Ok(self.0)
        }
    }

    fn base_item(kind: ItemKind) -> MediaItem {
        MediaItem {
            id: Uuid::new_v4(),
            kind,
            external_ids: ExternalIds { tmdb_id: Some("1399".into()), ..ExternalIds::default() },
            title: "Show".into(),
            year: Some(2011),
            aired_at: None,
            country: None,
            is_anime: false,
            parent_id: None,
            number: None,
            absolute_number: None,
            streams: vec![],
            blacklisted_streams: HashSet::new(),
            active_stream: None,
            filesystem_entries: vec![],
            aliases: Aliases::default(),
            scraped_at: None,
        }
    }

    fn service(repo: Arc<ItemRepository>, expected: u32) -> PostProcessingService {
        let validator = EpisodeValidator::new(Arc::clone(&repo), None, vec![], Arc::new(FixedEpisodeCount(expected)), EventBus::with_capacity(8));
        PostProcessingService::new(repo, validator)
    }

    #[test]
    fn name_identifies_stage() {
        assert_eq!(service(Arc::new(ItemRepository::new()), 1).name(), "postprocessing");
    }

    #[tokio::test]
    async fn run_settles_immediately_for_non_season_items() {
        let repo = Arc::new(ItemRepository::new());
        let svc = service(Arc::clone(&repo), 2);
        let movie = base_item(ItemKind::Movie);

        let outcome = svc.run(movie).await.expect("run succeeds");
        assert!(matches!(outcome, ServiceOutcome::Settled));
    }

    #[tokio::test]
    async fn run_settles_when_the_season_has_no_gap() {
        let repo = Arc::new(ItemRepository::new());
        let mut show = base_item(ItemKind::Show);
        let show_id = show.id;
        show.parent_id = None;
        repo.insert(show).expect("insert show");

        let mut season = base_item(ItemKind::Season);
        season.parent_id = Some(show_id);
        season.number = Some(1);
        let season_id = season.id;
        repo.insert(season.clone()).expect("insert season");

        let mut episode = base_item(ItemKind::Episode);
        episode.parent_id = Some(season_id);
        episode.number = Some(1);
        repo.insert(episode).expect("insert episode");

        let svc = service(repo, 1);
        let outcome = svc.run(season).await.expect("run succeeds");
        assert!(matches!(outcome, ServiceOutcome::Settled));
    }

    #[tokio::test]
    async fn run_fans_out_a_missing_episode() {
        let repo = Arc::new(ItemRepository::new());
        let mut show = base_item(ItemKind::Show);
        let show_id = show.id;
        show.parent_id = None;
        repo.insert(show).expect("insert show");

        let mut season = base_item(ItemKind::Season);
        season.parent_id = Some(show_id);
        season.number = Some(1);
        repo.insert(season.clone()).expect("insert season");

        let svc = service(repo, 1);
        let outcome = svc.run(season).await.expect("run succeeds");
        match outcome {
            ServiceOutcome::Fanout(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].number, Some(1));
            }
            _ => panic!("expected Fanout"),
        }
    }
}

//! Episode Validator: after a season reaches Completed, reconciles the
//! actual episode count against the metadata provider and re-queues or
//! re-harvests any gaps.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use riven_data::ItemRepository;
use riven_debrid::DebridProvider;
use riven_events::{Event, EventBus, ItemState};
use riven_harvester::{cooldown, rd_library, HarvestQuery, HarvesterClient};
use riven_media::{HarvestedRelease, ItemKind, MediaItem};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PostprocessError, PostprocessResult};
use crate::metadata::EpisodeCountProvider;

/// Detects missing episodes in a season and either re-queues an existing
/// Episode entity or creates a new one, optionally seeding it with
/// harvester-resolved releases.
pub struct EpisodeValidator {
    repo: Arc<ItemRepository>,
    harvester: Option<Arc<HarvesterClient>>,
    providers: Vec<Arc<dyn DebridProvider>>,
    metadata: Arc<dyn EpisodeCountProvider>,
    events: EventBus,
}

impl EpisodeValidator {
    /// Construct a validator. `harvester` of `None` disables targeted
    /// re-harvesting; missing episodes are still created/re-queued with
    /// empty `w2p_releases`.
    #[must_use]
    pub fn new(
        repo: Arc<ItemRepository>,
        harvester: Option<Arc<HarvesterClient>>,
        providers: Vec<Arc<dyn DebridProvider>>,
        metadata: Arc<dyn EpisodeCountProvider>,
        events: EventBus,
    ) -> Self {
        Self {
            repo,
            harvester,
            providers,
            metadata,
            events,
        }
    }

    /// Reconcile `season_id` against the metadata provider, returning the
    /// ids of episodes that were created or re-queued.
    ///
    /// # Errors
    ///
    /// Returns an error if `season_id` does not resolve to a Season with a
    /// parent Show, if the metadata provider lookup fails, or if a
    /// repository/event-bus operation fails.
    pub async fn validate_season(&self, season_id: Uuid) -> PostprocessResult<Vec<Uuid>> {
        let season = self.repo.get(season_id)?;
        if season.kind != ItemKind::Season {
            return Err(PostprocessError::NotASeason { id: season_id });
        }
        let show_id = season.parent_id.ok_or(PostprocessError::OrphanSeason { id: season_id })?;
        let show = self.repo.get(show_id)?;

        let episodes = self.repo.children_of(season_id);
        let actual: HashSet<u32> = episodes.iter().filter_map(|e| e.number).collect();
        let max_actual = actual.iter().copied().max().unwrap_or(0);

        let expected = self
            .metadata
            .expected_episode_count(&show, &season)
            .await
            .map_err(|message| PostprocessError::Metadata { id: season_id, message })?;

        let mut missing: Vec<u32> = (1..=max_actual).filter(|n| !actual.contains(n)).collect();
        missing.extend((max_actual + 1)..=expected);
        missing.sort_unstable();

        if missing.is_empty() {
            debug!(season = %season_id, "no episode gap detected");
            return Ok(Vec::new());
        }

        info!(season = %season_id, ?missing, "episode gap detected");
        self.events
            .publish(Event::EpisodeGapDetected {
                season_id,
                missing_episodes: missing.clone(),
            })
            .map_err(|source| PostprocessError::EventPublish { id: season_id, source })?;

        let mut enqueued = Vec::new();
        for episode_number in missing {
            let existing = episodes.iter().find(|e| e.number == Some(episode_number)).cloned();
            let id = self.reconcile_episode(&show, &season, episode_number, existing).await?;
            enqueued.push(id);
        }
        Ok(enqueued)
    }

    async fn reconcile_episode(
        &self,
        show: &MediaItem,
        season: &MediaItem,
        episode_number: u32,
        existing: Option<MediaItem>,
    ) -> PostprocessResult<Uuid> {
        let now = Utc::now();
        let mut aliases = existing.as_ref().map(|e| e.aliases.clone()).unwrap_or_default();

        if self.harvester_enabled() && cooldown::should_attempt(&aliases, now) {
            let releases = self.harvest_episode(show, season, episode_number).await;
            aliases.w2p_releases = releases;
            cooldown::record_attempt(&mut aliases, now);
        }

        if let Some(existing) = existing {
            self.repo.update(existing.id, move |item| {
                item.aliases = aliases;
                item.scraped_at = None;
            })?;
            self.events
                .publish(Event::ItemStateChanged {
                    item_id: existing.id,
                    previous: None,
                    state: ItemState::Indexed,
                })
                .map_err(|source| PostprocessError::EventPublish { id: existing.id, source })?;
            Ok(existing.id)
        } else {
            let new_id = Uuid::new_v4();
            let episode = MediaItem {
                id: new_id,
                kind: ItemKind::Episode,
                external_ids: riven_media::ExternalIds::default(),
                title: format!("{} - Episode {episode_number}", show.title),
                year: season.year.or(show.year),
                aired_at: None,
                country: show.country.clone(),
                is_anime: show.is_anime,
                parent_id: Some(season.id),
                number: Some(episode_number),
                absolute_number: None,
                streams: vec![],
                blacklisted_streams: HashSet::new(),
                active_stream: None,
                filesystem_entries: vec![],
                aliases,
                scraped_at: None,
            };
            self.repo.insert(episode)?;
            self.events
                .publish(Event::ItemCreated {
                    item_id: new_id,
                    source: "episode_validator".to_string(),
                })
                .map_err(|source| PostprocessError::EventPublish { id: new_id, source })?;
            Ok(new_id)
        }
    }

    fn harvester_enabled(&self) -> bool {
        self.harvester.as_ref().is_some_and(|h| h.enabled())
    }

    async fn harvest_episode(&self, show: &MediaItem, season: &MediaItem, episode_number: u32) -> Vec<HarvestedRelease> {
        let Some(harvester) = &self.harvester else {
            return Vec::new();
        };
        let id = show.external_ids.canonical().unwrap_or(&show.title).to_string();
        let query = HarvestQuery::show(id, show.title.clone(), show.year, season.number, Some(episode_number));

        let outcome = match harvester.harvest_item(query).await {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, show = %show.id, episode = episode_number, "harvester call failed, treating as no releases");
                return Vec::new();
            }
        };

        if !outcome.releases.is_empty() || !outcome.needs_rd_library_check {
            return outcome.releases;
        }

        let Some(provider) = self.providers.iter().find(|p| p.initialized()) else {
            return Vec::new();
        };
        rd_library::rd_library_fallback(provider.as_ref(), &show.title)
            .await
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_media::{Aliases, ExternalIds};

    struct FixedEpisodeCount(u32);

    #[async_trait::async_trait]
    impl EpisodeCountProvider for FixedEpisodeCount {
        async fn expected_episode_count(&self, _show: &MediaItem, _season: &MediaItem) -> Result<u32, String> {
            Ok(self.0)
        }
    }

    fn base_item(kind: ItemKind) -> MediaItem {
        MediaItem {
            id: Uuid::new_v4(),
            kind,
            external_ids: ExternalIds {
                tmdb_id: Some("1399".into()),
                ..ExternalIds::default()
            },
            title: "Game of Chairs".into(),
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

    fn seed_show_and_season(repo: &ItemRepository, episode_numbers: &[u32]) -> (Uuid, Uuid) {
        let mut show = base_item(ItemKind::Show);
        let show_id = show.id;
        show.parent_id = None;
        repo.insert(show).unwrap();

        let mut season = base_item(ItemKind::Season);
        let season_id = season.id;
        season.parent_id = Some(show_id);
        season.number = Some(1);
        season.external_ids = ExternalIds::default();
        repo.insert(season).unwrap();

        for &n in episode_numbers {
            let mut episode = base_item(ItemKind::Episode);
            episode.parent_id = Some(season_id);
            episode.number = Some(n);
            episode.external_ids = ExternalIds::default();
            repo.insert(episode).unwrap();
        }
        (show_id, season_id)
    }

    fn validator(repo: Arc<ItemRepository>, expected: u32) -> EpisodeValidator {
        EpisodeValidator::new(
            repo,
            None,
            vec![],
            Arc::new(FixedEpisodeCount(expected)),
            EventBus::with_capacity(16),
        )
    }

    #[tokio::test]
    async fn no_gap_returns_no_enqueued_items() {
        let repo = Arc::new(ItemRepository::new());
        let (_show_id, season_id) = seed_show_and_season(&repo, &[1, 2, 3]);
        let validator = validator(repo, 3);
        let enqueued = validator.validate_season(season_id).await.unwrap();
        assert!(enqueued.is_empty());
    }

    #[tokio::test]
    async fn missing_middle_episode_is_created_without_a_harvester() {
        let repo = Arc::new(ItemRepository::new());
        let (_show_id, season_id) = seed_show_and_season(&repo, &[1, 3]);
        let validator = validator(Arc::clone(&repo), 3);
        let enqueued = validator.validate_season(season_id).await.unwrap();
        assert_eq!(enqueued.len(), 1);
        let created = repo.get(enqueued[0]).unwrap();
        assert_eq!(created.number, Some(2));
        assert_eq!(created.parent_id, Some(season_id));
        assert!(created.aliases.w2p_releases.is_empty());
    }

    #[tokio::test]
    async fn gap_past_the_last_known_episode_extends_to_expected_count() {
        let repo = Arc::new(ItemRepository::new());
        let (_show_id, season_id) = seed_show_and_season(&repo, &[1, 2]);
        let validator = validator(Arc::clone(&repo), 4);
        let enqueued = validator.validate_season(season_id).await.unwrap();
        let mut numbers: Vec<_> = enqueued.iter().map(|id| repo.get(*id).unwrap().number.unwrap()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![3, 4]);
    }

    #[tokio::test]
    async fn non_season_item_is_rejected() {
        let repo = Arc::new(ItemRepository::new());
        let mut movie = base_item(ItemKind::Movie);
        let movie_id = movie.id;
        movie.kind = ItemKind::Movie;
        repo.insert(movie).unwrap();
        let validator = validator(repo, 1);
        let err = validator.validate_season(movie_id).await.unwrap_err();
        assert!(matches!(err, PostprocessError::NotASeason { .. }));
    }
}

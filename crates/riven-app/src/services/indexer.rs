//! Indexer service: resolves external identifiers via the metadata provider
//! and fans a childless Show/Season out into its Season/Episode children.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use riven_data::ItemRepository;
use riven_events::{Event, EventBus};
use riven_media::{Aliases, ItemKind, MediaItem};
use riven_scheduler::{Service, ServiceError, ServiceOutcome};
use uuid::Uuid;

use crate::error::AppError;
use crate::metadata::TmdbClient;

/// Resolves a Movie/Episode's external ids against the metadata provider,
/// and creates the Season/Episode children of a newly-indexed Show/Season.
pub struct IndexerService {
    repo: Arc<ItemRepository>,
    metadata: Arc<TmdbClient>,
    events: EventBus,
}

impl IndexerService {
    /// Construct the indexer over a shared repository, metadata client, and
    /// event bus (used to announce the children it creates).
    #[must_use]
    pub fn new(repo: Arc<ItemRepository>, metadata: Arc<TmdbClient>, events: EventBus) -> Self {
        Self { repo, metadata, events }
    }

    async fn index_movie(&self, mut item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        if item.external_ids.is_empty() {
            let ids = self.metadata.resolve_movie(&item.title, item.year).await.map_err(retry_later)?;
            if ids.is_empty() {
                return Err(ServiceError::transient("no metadata match yet", retry_at()));
            }
            item.external_ids = ids;
        }
        Ok(ServiceOutcome::Advance(item))
    }

    fn index_episode(&self, mut item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        if item.external_ids.is_empty() {
            let season_id = item.parent_id.ok_or_else(|| ServiceError::fatal("episode has no parent season"))?;
            let season = self.repo.get(season_id).map_err(|err| ServiceError::fatal(err.to_string()))?;
            item.external_ids = season.external_ids;
        }
        Ok(ServiceOutcome::Advance(item))
    }

    async fn index_show(&self, mut item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        if item.external_ids.is_empty() {
            let ids = self.metadata.resolve_show(&item.title, item.year).await.map_err(retry_later)?;
            if ids.is_empty() {
                return Err(ServiceError::transient("no metadata match yet", retry_at()));
            }
            item.external_ids = ids;
        }

        let item_id = item.id;
        self.repo
            .update(item_id, {
                let ids = item.external_ids.clone();
                move |stored| stored.external_ids = ids
            })
            .map_err(|err| ServiceError::fatal(err.to_string()))?;
        self.publish_state_resolved(item_id);

        let Some(tmdb_id) = item.external_ids.tmdb_id.clone() else {
            return Ok(ServiceOutcome::Settled);
        };
        let seasons = self.metadata.seasons(&tmdb_id).await.map_err(retry_later)?;

        let mut children = Vec::with_capacity(seasons.len());
        for season in seasons.into_iter().filter(|s| s.season_number > 0) {
            let child = MediaItem {
                id: Uuid::new_v4(),
                kind: ItemKind::Season,
                external_ids: item.external_ids.clone(),
                title: season.name,
                year: item.year,
                aired_at: None,
                country: item.country.clone(),
                is_anime: item.is_anime,
                parent_id: Some(item.id),
                number: Some(season.season_number),
                absolute_number: None,
                streams: vec![],
                blacklisted_streams: Default::default(),
                active_stream: None,
                filesystem_entries: vec![],
                aliases: Aliases::default(),
                scraped_at: None,
            };
            self.insert_child(child.clone())?;
            children.push(child);
        }

        if children.is_empty() {
            return Ok(ServiceOutcome::Settled);
        }
        Ok(ServiceOutcome::Fanout(children))
    }

    async fn index_season(&self, item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        let Some(tmdb_id) = item.external_ids.tmdb_id.clone() else {
            return Err(ServiceError::fatal("season has no inherited tmdb id"));
        };
        let Some(season_number) = item.number else {
            return Err(ServiceError::fatal("season has no season number"));
        };
        let episodes = self.metadata.episodes(&tmdb_id, season_number).await.map_err(retry_later)?;

        let mut children = Vec::with_capacity(episodes.len());
        for episode in episodes {
            let child = MediaItem {
                id: Uuid::new_v4(),
                kind: ItemKind::Episode,
                external_ids: item.external_ids.clone(),
                title: episode.name,
                year: item.year,
                aired_at: episode.air_date.as_deref().and_then(parse_air_date),
                country: item.country.clone(),
                is_anime: item.is_anime,
                parent_id: Some(item.id),
                number: Some(episode.episode_number),
                absolute_number: None,
                streams: vec![],
                blacklisted_streams: Default::default(),
                active_stream: None,
                filesystem_entries: vec![],
                aliases: Aliases::default(),
                scraped_at: None,
            };
            self.insert_child(child.clone())?;
            children.push(child);
        }

        if children.is_empty() {
            return Ok(ServiceOutcome::Settled);
        }
        Ok(ServiceOutcome::Fanout(children))
    }

    fn insert_child(&self, child: MediaItem) -> Result<(), ServiceError> {
        let child_id = child.id;
        self.repo.insert(child).map_err(|err| ServiceError::fatal(err.to_string()))?;
        if let Err(err) = self.events.publish(Event::ItemCreated { item_id: child_id, source: "indexer".to_string() }) {
            tracing::warn!(item_id = %child_id, error = %err, "failed to publish item-created event");
        }
        Ok(())
    }

    fn publish_state_resolved(&self, item_id: Uuid) {
        if let Err(err) = self.events.publish(Event::ItemStateChanged {
            item_id,
            previous: None,
            state: riven_events::ItemState::Indexed,
        }) {
            tracing::warn!(item_id = %item_id, error = %err, "failed to publish item-state-changed event");
        }
    }
}

fn retry_later(err: AppError) -> ServiceError {
    ServiceError::transient(err.to_string(), retry_at())
}

fn retry_at() -> DateTime<Utc> {
    Utc::now() + Duration::hours(6)
}

fn parse_air_date(value: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[async_trait]
impl Service for IndexerService {
    fn name(&self) -> &'static str {
        "indexer"
    }

    async fn run(&self, item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        match item.kind {
            ItemKind::Movie => self.index_movie(item).await,
            ItemKind::Episode => self.index_episode(item),
            ItemKind::Show => self.index_show(item).await,
            ItemKind::Season => self.index_season(item).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use riven_config::MetadataConfig;
    use riven_media::ExternalIds;

    use super::*;
    use crate::metadata::TmdbClient;

    fn bare_item(kind: ItemKind, parent_id: Option<Uuid>) -> MediaItem {
        MediaItem {
            id: Uuid::new_v4(),
            kind,
            external_ids: ExternalIds::default(),
            title: "Title".into(),
            year: None,
            aired_at: None,
            country: None,
            is_anime: false,
            parent_id,
            number: Some(1),
            absolute_number: None,
            streams: vec![],
            blacklisted_streams: Default::default(),
            active_stream: None,
            filesystem_entries: vec![],
            aliases: Aliases::default(),
            scraped_at: None,
        }
    }

    fn service() -> IndexerService {
        let repo = Arc::new(ItemRepository::new());
        let metadata = Arc::new(TmdbClient::new(MetadataConfig::default()));
        IndexerService::new(repo, metadata, EventBus::new())
    }

    #[test]
    fn name_identifies_stage() {
        assert_eq!(service().name(), "indexer");
    }

    #[test]
    fn index_episode_inherits_parent_external_ids() {
        let svc = service();
        let mut season = bare_item(ItemKind::Season, None);
        season.external_ids = ExternalIds { imdb_id: Some("tt9".into()), tmdb_id: None, tvdb_id: None };
        let season_id = season.id;
        svc.repo.insert(season).expect("insert season");

        let episode = bare_item(ItemKind::Episode, Some(season_id));
        let outcome = svc.index_episode(episode).expect("index episode");
        match outcome {
            ServiceOutcome::Advance(item) => assert_eq!(item.external_ids.imdb_id.as_deref(), Some("tt9")),
            _ => panic!("expected Advance"),
        }
    }

    #[test]
    fn index_episode_skips_lookup_when_already_resolved() {
        let svc = service();
        let mut episode = bare_item(ItemKind::Episode, None);
        episode.external_ids = ExternalIds { imdb_id: Some("tt1".into()), tmdb_id: None, tvdb_id: None };
        let outcome = svc.index_episode(episode).expect("already indexed episodes skip lookup");
        match outcome {
            ServiceOutcome::Advance(item) => assert_eq!(item.external_ids.imdb_id.as_deref(), Some("tt1")),
            _ => panic!("expected Advance"),
        }
    }

    #[test]
    fn index_episode_without_parent_is_fatal() {
        let svc = service();
        let episode = bare_item(ItemKind::Episode, None);
        let err = svc.index_episode(episode).unwrap_err();
        assert!(err.cooldown.is_none(), "a missing parent is not retryable");
    }

    #[test]
    fn parse_air_date_accepts_iso_dates_and_rejects_garbage() {
        let parsed = parse_air_date("2016-07-04").expect("valid date");
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2016-07-04");
        assert!(parse_air_date("not-a-date").is_none());
    }

    #[test]
    fn retry_at_is_roughly_six_hours_out() {
        let delta = retry_at() - Utc::now();
        assert!(delta.num_minutes() >= 359 && delta.num_minutes() <= 360);
    }
}

//! Scraper service: refreshes harvester-resolved releases (cooldown-gated),
//! then ranks and selects streams across every configured profile.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use riven_config::ConfigService;
use riven_data::ItemRepository;
use riven_debrid::DebridProvider;
use riven_events::{Event, EventBus};
use riven_harvester::{cooldown, rd_library, HarvestQuery, HarvesterClient};
use riven_media::{ItemKind, MediaItem};
use riven_ranking::{merge_scraper_results, rank_and_select, HarvestedReleasesScraper, ItemContext, Scraper};
use riven_scheduler::{Service, ServiceError, ServiceOutcome};

/// Re-harvests releases for an item (subject to the W2P backoff window), then
/// ranks and selects streams against every ranking profile.
pub struct ScraperService {
    repo: Arc<ItemRepository>,
    harvester: Option<Arc<HarvesterClient>>,
    providers: Vec<Arc<dyn DebridProvider>>,
    config: Arc<ConfigService>,
    events: EventBus,
    scrapers: Vec<Arc<dyn Scraper>>,
}

impl ScraperService {
    /// Construct the scraper stage. `harvester` of `None` disables W2P
    /// re-harvesting; the fan-in still runs against whatever releases are
    /// already attached to the item.
    #[must_use]
    pub fn new(
        repo: Arc<ItemRepository>,
        harvester: Option<Arc<HarvesterClient>>,
        providers: Vec<Arc<dyn DebridProvider>>,
        config: Arc<ConfigService>,
        events: EventBus,
    ) -> Self {
        Self {
            repo,
            harvester,
            providers,
            config,
            events,
            scrapers: vec![Arc::new(HarvestedReleasesScraper)],
        }
    }

    async fn refresh_harvested_releases(&self, item: &mut MediaItem) {
        let Some(harvester) = &self.harvester else {
            return;
        };
        if !harvester.enabled() || !cooldown::should_attempt(&item.aliases, Utc::now()) {
            return;
        }

        let query = match item.kind {
            ItemKind::Movie => HarvestQuery::movie(item.id.to_string(), item.title.clone(), item.year),
            ItemKind::Episode => {
                let parent_numbers = self.parent_season_number(item);
                HarvestQuery::show(item.id.to_string(), item.title.clone(), item.year, parent_numbers, item.number)
            }
            ItemKind::Show | ItemKind::Season => {
                HarvestQuery::show(item.id.to_string(), item.title.clone(), item.year, item.number, None)
            }
        };

        cooldown::record_attempt(&mut item.aliases, Utc::now());

        match harvester.harvest_item(query).await {
            Ok(outcome) => {
                item.aliases.w2p_releases = outcome.releases;
                if item.aliases.w2p_releases.is_empty() && outcome.needs_rd_library_check {
                    self.fall_back_to_rd_library(item).await;
                }
            }
            Err(err) => {
                tracing::warn!(item_id = %item.id, error = %err, "harvester request failed");
            }
        }
    }

    async fn fall_back_to_rd_library(&self, item: &mut MediaItem) {
        for provider in &self.providers {
            if !provider.initialized() {
                continue;
            }
            match rd_library::rd_library_fallback(provider.as_ref(), &item.title).await {
                Ok(releases) if !releases.is_empty() => {
                    item.aliases.w2p_releases = releases;
                    return;
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(provider = provider.name(), error = %err, "rd-library fallback failed"),
            }
        }
    }

    fn parent_season_number(&self, item: &MediaItem) -> Option<u32> {
        let parent_id = item.parent_id?;
        self.repo.get(parent_id).ok().and_then(|season| season.number)
    }

    fn build_context(&self, item: &MediaItem, dubbed_anime_only: bool) -> ItemContext {
        let parent_season_number = if item.kind == ItemKind::Episode { self.parent_season_number(item) } else { None };
        let children = self.repo.children_of(item.id);
        ItemContext {
            kind: item.kind,
            number: item.number,
            absolute_number: item.absolute_number,
            parent_season_number,
            season_numbers: if item.kind == ItemKind::Show {
                children.iter().filter_map(|c| c.number).collect()
            } else {
                vec![]
            },
            episode_numbers: if item.kind == ItemKind::Season {
                children.iter().filter_map(|c| c.number).collect()
            } else {
                vec![]
            },
            country: item.country.clone(),
            aired_year: item.year,
            is_anime: item.is_anime,
            dubbed_anime_only,
        }
    }

    /// The ordered ranking-profile set for `item`: derived from the
    /// configured library path via longest-prefix lookup in `path_profiles`,
    /// falling back to `default_profile` — never the full profile catalog.
    fn profiles_for(&self, settings: &riven_config::Settings) -> Vec<(String, riven_media::RankingProfile)> {
        let library_path = settings.symlink_library_path.as_deref().unwrap_or(settings.mount_path.as_path());
        let profile_name = settings.profile_for_path(&library_path.to_string_lossy());
        settings
            .ranking_profile(profile_name)
            .map(|profile| (profile.name.clone(), profile.clone()))
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl Service for ScraperService {
    fn name(&self) -> &'static str {
        "scraper"
    }

    async fn run(&self, mut item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        self.refresh_harvested_releases(&mut item).await;

        let merged = merge_scraper_results(&item, &self.scrapers).await;
        let settings = self.config.current();
        let ctx = self.build_context(&item, settings.scraping.dubbed_anime_only);
        let profiles = self.profiles_for(&settings);

        let (selected, _duplicates) = rank_and_select(&merged, &ctx, &profiles);
        if selected.is_empty() {
            return Err(ServiceError::transient("no ranked streams yet", Utc::now() + Duration::minutes(15)));
        }

        for stream in selected {
            if let Err(err) = item.add_stream(stream) {
                tracing::debug!(item_id = %item.id, error = %err, "dropped blacklisted stream");
            }
        }
        item.scraped_at = Some(Utc::now());

        if let Err(err) = self.events.publish(Event::StreamsRanked { item_id: item.id, stream_count: item.streams.len() }) {
            tracing::warn!(item_id = %item.id, error = %err, "failed to publish streams-ranked event");
        }

        Ok(ServiceOutcome::Advance(item))
    }
}

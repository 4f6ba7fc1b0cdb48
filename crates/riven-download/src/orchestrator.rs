//! Download Orchestrator: turns an item's ranked Streams into MediaEntries
//! via one or more debrid providers, never blacklisting a Stream that failed
//! solely because a provider was in circuit-breaker cooldown.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use riven_data::ItemRepository;
use riven_debrid::{CooldownRegistry, DebridError, DebridProvider};
use riven_events::{Event, EventBus};
use riven_media::{ActiveStream, ContainerFile, ItemKind, TorrentContainer};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DownloadError, DownloadResult};
use crate::matcher::{attach_entry, match_container_files};
use crate::prevalidate::{apply_prevalidation_order, prevalidate_hq_candidates};

/// How the orchestrator's pass over an item concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every desired infohash is now present in `filesystem_entries`.
    Success,
    /// No stream succeeded and every provider was in cooldown; re-dispatch
    /// no earlier than `until`.
    Cooldown {
        /// Earliest time any provider's cooldown clears.
        until: DateTime<Utc>,
    },
    /// No stream succeeded for reasons other than provider cooldown.
    SoftFailure,
}

/// Drives the per-stream attempt loop for one item.
pub struct DownloadOrchestrator {
    repo: Arc<ItemRepository>,
    providers: Vec<Arc<dyn DebridProvider>>,
    cooldowns: Arc<CooldownRegistry>,
    events: EventBus,
}

impl DownloadOrchestrator {
    /// Construct an orchestrator over `providers`, tried in the given order.
    #[must_use]
    pub fn new(
        repo: Arc<ItemRepository>,
        providers: Vec<Arc<dyn DebridProvider>>,
        cooldowns: Arc<CooldownRegistry>,
        events: EventBus,
    ) -> Self {
        Self {
            repo,
            providers,
            cooldowns,
            events,
        }
    }

    /// Process `item_id`: compute its desired set, attempt each pending
    /// Stream in turn, and return how the pass concluded.
    ///
    /// `on_yield` is called after every 3rd stream attempted, a cooperative
    /// re-entry hint for the caller's scheduler; it performs no suspension
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the item cannot be looked up or an event
    /// fails to publish. Per-provider failures are handled inline and never
    /// propagate as `Err`.
    pub async fn process_item(
        &self,
        item_id: Uuid,
        keep_versions: u32,
        mut on_yield: impl FnMut(Uuid),
    ) -> DownloadResult<Outcome> {
        let item = self.repo.get(item_id)?;
        let now = Utc::now();

        let materialized: HashSet<String> = item
            .filesystem_entries
            .iter()
            .map(|entry| entry.infohash.clone())
            .collect();

        let mut seen = HashSet::new();
        let mut desired: Vec<String> = item
            .streams
            .iter()
            .map(|s| s.infohash().to_string())
            .filter(|hash| !item.blacklisted_streams.contains(hash) && seen.insert(hash.clone()))
            .collect();
        desired.truncate(keep_versions as usize);

        let mut pending: Vec<String> = desired
            .iter()
            .filter(|hash| !materialized.contains(*hash))
            .cloned()
            .collect();

        if pending.is_empty() {
            return Ok(Outcome::Success);
        }

        self.events
            .publish(Event::DownloadStarted { item_id })
            .map_err(|source| DownloadError::EventPublish { id: item_id, source })?;

        let pending_streams: Vec<_> = pending
            .iter()
            .filter_map(|hash| item.streams.iter().find(|s| s.infohash() == hash).cloned())
            .collect();
        let prevalidated = prevalidate_hq_candidates(&item, &pending_streams, &self.providers).await;
        pending = apply_prevalidation_order(pending, &prevalidated);

        let mut used_probes: HashSet<(String, String)> = HashSet::new();
        let mut any_real_attempt = false;
        let mut attempted = 0usize;
        let mut succeeded_any = false;

        for infohash in &pending {
            if materialized.len() + used_probes.len() >= keep_versions as usize {
                break;
            }
            let Some(stream) = item.streams.iter().find(|s| s.infohash() == infohash) else {
                continue;
            };
            let profile_name = stream.profile_name().to_string();
            let prevalidated_container = prevalidated
                .iter()
                .find(|c| &c.infohash == infohash)
                .map(|c| (c.provider.clone(), c.container.clone()));

            let mut stream_succeeded = false;
            let mut saw_real_failure = false;

            for provider in &self.providers {
                if !provider.initialized() {
                    continue;
                }
                if self.cooldowns.is_cooling_down(provider.name(), now) {
                    continue;
                }

                let availability = if let Some((probe_provider, probe_container)) = &prevalidated_container {
                    if probe_provider.as_str() == provider.name() {
                        Ok(Some(probe_container.clone()))
                    } else {
                        provider.instant_availability(infohash, item.kind).await
                    }
                } else {
                    provider.instant_availability(infohash, item.kind).await
                };

                let container = match availability {
                    Ok(Some(container)) => {
                        any_real_attempt = true;
                        container
                    }
                    Ok(None) => {
                        any_real_attempt = true;
                        continue;
                    }
                    Err(DebridError::CircuitBreakerOpen { provider: name }) => {
                        self.cooldowns.trip(&name, now);
                        debug!(provider = %name, item = %item_id, "provider in circuit-breaker cooldown");
                        continue;
                    }
                    Err(DebridError::NotCached { .. }) => {
                        any_real_attempt = true;
                        continue;
                    }
                    Err(other) => {
                        warn!(provider = provider.name(), error = %other, "debrid provider error");
                        any_real_attempt = true;
                        saw_real_failure = true;
                        continue;
                    }
                };

                match self
                    .attempt_download(provider.as_ref(), &container, &item, &profile_name)
                    .await
                {
                    Ok(true) => {
                        used_probes.insert((provider.name().to_string(), infohash.clone()));
                        stream_succeeded = true;
                        break;
                    }
                    Ok(false) => {
                        saw_real_failure = true;
                    }
                    Err(err) => {
                        warn!(provider = provider.name(), error = %err, "download attempt failed");
                        saw_real_failure = true;
                    }
                }
            }

            if stream_succeeded {
                succeeded_any = true;
            } else if saw_real_failure {
                self.blacklist_stream(item_id, infohash)?;
            }

            attempted += 1;
            if attempted % 3 == 0 {
                on_yield(item_id);
            }
        }

        self.cleanup_unused_probes(&prevalidated, &used_probes).await;

        let refreshed = self.repo.get(item_id)?;
        let still_missing = desired
            .iter()
            .any(|hash| !refreshed.filesystem_entries.iter().any(|e| &e.infohash == hash));

        if !still_missing {
            for provider in &self.providers {
                self.cooldowns.clear(provider.name());
            }
            Ok(Outcome::Success)
        } else if succeeded_any || any_real_attempt {
            Ok(Outcome::SoftFailure)
        } else if let Some(until) = self.cooldowns.earliest_deadline(now) {
            Ok(Outcome::Cooldown { until })
        } else {
            Ok(Outcome::SoftFailure)
        }
    }

    /// Resolve a container to a committed, file-selected torrent and match
    /// its files to the item. Returns whether at least one file matched.
    async fn attempt_download(
        &self,
        provider: &dyn DebridProvider,
        container: &TorrentContainer,
        item: &riven_media::MediaItem,
        profile_name: &str,
    ) -> DownloadResult<bool> {
        let valid_files: Vec<ContainerFile> = container
            .files
            .iter()
            .filter(|f| f.size_bytes > 0 && !f.filename.is_empty() && !f.file_id.is_empty())
            .cloned()
            .collect();
        if valid_files.is_empty() {
            return Ok(false);
        }

        let mut working = container.clone();
        working.files = valid_files;
        if working.torrent_id.is_empty() {
            let torrent_id = provider.add_torrent(&working.infohash).await?;
            working = provider.get_torrent_info(&torrent_id).await?;
        }
        let file_ids: Vec<String> = working.files.iter().map(|f| f.file_id.clone()).collect();
        provider.select_files(&working.torrent_id, &file_ids).await?;

        let matches = match_container_files(&self.repo, item, &working, provider.name(), profile_name)?;
        if matches.is_empty() {
            let _ = provider.delete_torrent(&working.torrent_id).await;
            return Ok(false);
        }

        for matched in &matches {
            let infohash = matched.entry.infohash.clone();
            let leaf_id = matched.leaf_id;
            let entry = matched.entry.clone();
            self.repo.update(leaf_id, move |leaf| attach_entry(leaf, entry))?;
            self.events
                .publish(Event::MediaEntryCreated {
                    item_id: leaf_id,
                    infohash: infohash.clone(),
                    profile_name: profile_name.to_string(),
                })
                .map_err(|source| DownloadError::EventPublish { id: leaf_id, source })?;
        }

        if item.kind != ItemKind::Movie {
            let active = ActiveStream {
                infohash: working.infohash.clone(),
                provider_torrent_id: working.torrent_id.clone(),
            };
            self.repo
                .update(item.id, move |leaf| leaf.active_stream = Some(active))?;
        }

        Ok(true)
    }

    fn blacklist_stream(&self, item_id: Uuid, infohash: &str) -> DownloadResult<()> {
        let infohash = infohash.to_string();
        self.repo.update(item_id, {
            let infohash = infohash.clone();
            move |item| {
                item.blacklisted_streams.insert(infohash);
            }
        })?;
        self.events
            .publish(Event::StreamBlacklisted { item_id, infohash })
            .map_err(|source| DownloadError::EventPublish { id: item_id, source })?;
        Ok(())
    }

    async fn cleanup_unused_probes(
        &self,
        prevalidated: &[crate::prevalidate::PrevalidatedCandidate],
        used: &HashSet<(String, String)>,
    ) {
        for candidate in prevalidated {
            if used.contains(&(candidate.provider.clone(), candidate.infohash.clone())) {
                continue;
            }
            if let Some(provider) = self.providers.iter().find(|p| p.name() == candidate.provider) {
                let _ = provider.delete_torrent(&candidate.container.torrent_id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riven_debrid::{DebridResult, DownloadEntry, UserInfo};
    use riven_media::{Aliases, ExternalIds, MediaItem, ParsedData, Stream, TorrentInfo};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubProvider {
        name: String,
        initialized: bool,
        containers: Mutex<HashMap<String, TorrentContainer>>,
        fail_circuit_breaker: bool,
    }

    impl StubProvider {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                initialized: true,
                containers: Mutex::new(HashMap::new()),
                fail_circuit_breaker: false,
            }
        }

        fn with_container(self, infohash: &str, container: TorrentContainer) -> Self {
            self.containers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(infohash.to_string(), container);
            self
        }
    }

    #[async_trait]
    impl DebridProvider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn initialized(&self) -> bool {
            self.initialized
        }

        async fn instant_availability(
            &self,
            infohash: &str,
            _item_type: ItemKind,
        ) -> DebridResult<Option<TorrentContainer>> {
            if self.fail_circuit_breaker {
                return Err(DebridError::CircuitBreakerOpen {
                    provider: self.name.clone(),
                });
            }
            Ok(self
                .containers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(infohash)
                .cloned())
        }

        async fn add_torrent(&self, infohash: &str) -> DebridResult<String> {
            Ok(format!("torrent-{infohash}"))
        }

        async fn get_torrent_info(&self, torrent_id: &str) -> DebridResult<TorrentContainer> {
            self.containers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .values()
                .find(|c| c.torrent_id == torrent_id)
                .cloned()
                .ok_or_else(|| DebridError::NotFound {
                    provider: self.name.clone(),
                    torrent_id: torrent_id.to_string(),
                })
        }

        async fn select_files(&self, _torrent_id: &str, _file_ids: &[String]) -> DebridResult<()> {
            Ok(())
        }

        async fn delete_torrent(&self, _torrent_id: &str) -> DebridResult<()> {
            Ok(())
        }

        async fn get_downloads(&self) -> DebridResult<Vec<DownloadEntry>> {
            Ok(vec![])
        }

        async fn get_user_info(&self) -> DebridResult<UserInfo> {
            Ok(UserInfo {
                premium: true,
                user_id: Some("test".into()),
            })
        }
    }

    fn movie_with_stream(infohash: &str) -> MediaItem {
        MediaItem {
            id: Uuid::new_v4(),
            kind: ItemKind::Movie,
            external_ids: ExternalIds::default(),
            title: "A Movie".into(),
            year: Some(2022),
            aired_at: None,
            country: None,
            is_anime: false,
            parent_id: None,
            number: None,
            absolute_number: None,
            streams: vec![Stream::new(infohash, "A.Movie.2022.mkv", ParsedData::default(), 10, "default").unwrap()],
            blacklisted_streams: HashSet::new(),
            active_stream: None,
            filesystem_entries: vec![],
            aliases: Aliases::default(),
            scraped_at: None,
        }
    }

    fn container(infohash: &str, torrent_id: &str) -> TorrentContainer {
        TorrentContainer {
            infohash: infohash.to_string(),
            torrent_id: torrent_id.to_string(),
            torrent_info: TorrentInfo {
                size_bytes: 1000,
                file_count: 1,
            },
            files: vec![ContainerFile {
                filename: "A.Movie.2022.mkv".into(),
                size_bytes: 1000,
                file_id: "1".into(),
            }],
            pre_validated: false,
        }
    }

    #[tokio::test]
    async fn process_item_materializes_a_cached_movie_stream() {
        let repo = Arc::new(ItemRepository::new());
        let infohash = "a".repeat(40);
        let item = movie_with_stream(&infohash);
        let item_id = item.id;
        repo.insert(item).unwrap();

        let provider: Arc<dyn DebridProvider> = Arc::new(
            StubProvider::new("realdebrid").with_container(&infohash, container(&infohash, "t1")),
        );
        let orchestrator = DownloadOrchestrator::new(
            repo.clone(),
            vec![provider],
            Arc::new(CooldownRegistry::new()),
            EventBus::with_capacity(16),
        );

        let outcome = orchestrator.process_item(item_id, 1, |_| {}).await.unwrap();
        assert_eq!(outcome, Outcome::Success);
        let refreshed = repo.get(item_id).unwrap();
        assert_eq!(refreshed.filesystem_entries.len(), 1);
        assert_eq!(refreshed.filesystem_entries[0].infohash, infohash);
    }

    #[tokio::test]
    async fn process_item_does_not_blacklist_when_the_only_provider_is_in_cooldown() {
        let repo = Arc::new(ItemRepository::new());
        let infohash = "b".repeat(40);
        let item = movie_with_stream(&infohash);
        let item_id = item.id;
        repo.insert(item).unwrap();

        let provider: Arc<dyn DebridProvider> = Arc::new(StubProvider {
            name: "realdebrid".into(),
            initialized: true,
            containers: Mutex::new(HashMap::new()),
            fail_circuit_breaker: true,
        });
        let cooldowns = Arc::new(CooldownRegistry::new());
        let orchestrator = DownloadOrchestrator::new(
            repo.clone(),
            vec![provider],
            cooldowns.clone(),
            EventBus::with_capacity(16),
        );

        let outcome = orchestrator.process_item(item_id, 1, |_| {}).await.unwrap();
        assert!(matches!(outcome, Outcome::Cooldown { .. }));
        let refreshed = repo.get(item_id).unwrap();
        assert!(refreshed.blacklisted_streams.is_empty());
        assert!(cooldowns.is_cooling_down("realdebrid", Utc::now()));
    }

    #[tokio::test]
    async fn process_item_blacklists_a_stream_that_fails_to_match_on_every_provider() {
        let repo = Arc::new(ItemRepository::new());
        let infohash = "c".repeat(40);
        let item = movie_with_stream(&infohash);
        let item_id = item.id;
        repo.insert(item).unwrap();

        let mut empty_container = container(&infohash, "t1");
        empty_container.files.clear();
        let provider: Arc<dyn DebridProvider> = Arc::new(
            StubProvider::new("realdebrid").with_container(&infohash, empty_container),
        );
        let orchestrator = DownloadOrchestrator::new(
            repo.clone(),
            vec![provider],
            Arc::new(CooldownRegistry::new()),
            EventBus::with_capacity(16),
        );

        let outcome = orchestrator.process_item(item_id, 1, |_| {}).await.unwrap();
        assert_eq!(outcome, Outcome::SoftFailure);
        let refreshed = repo.get(item_id).unwrap();
        assert!(refreshed.blacklisted_streams.contains(&infohash));
    }

    #[tokio::test]
    async fn process_item_is_a_noop_success_when_nothing_is_pending() {
        let repo = Arc::new(ItemRepository::new());
        let item = movie_with_stream(&"d".repeat(40));
        let item_id = item.id;
        repo.insert(item).unwrap();
        repo.update(item_id, |item| item.streams.clear()).unwrap();

        let orchestrator = DownloadOrchestrator::new(
            repo.clone(),
            vec![],
            Arc::new(CooldownRegistry::new()),
            EventBus::with_capacity(16),
        );

        let outcome = orchestrator.process_item(item_id, 1, |_| {}).await.unwrap();
        assert_eq!(outcome, Outcome::Success);
    }
}

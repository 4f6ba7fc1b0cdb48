//! Filesystem service: registers a leaf's downloaded entries with the VFS
//! host, then enforces per-profile retention over them.

use std::sync::Arc;

use async_trait::async_trait;
use riven_config::ConfigService;
use riven_media::MediaItem;
use riven_scheduler::{Service, ServiceError, ServiceOutcome};
use riven_vfs::{RetentionEnforcer, VfsRegistrar};

/// Registers a leaf's `filesystem_entries` with the VFS host and trims
/// excess versions per the active ranking profiles' `keep_versions_per_item`.
pub struct FilesystemService {
    registrar: VfsRegistrar,
    retention: RetentionEnforcer,
    config: Arc<ConfigService>,
}

impl FilesystemService {
    /// Construct the adapter over a registrar/enforcer pair and the live
    /// configuration snapshot used to resolve `keep_versions_per_item`.
    #[must_use]
    pub fn new(registrar: VfsRegistrar, retention: RetentionEnforcer, config: Arc<ConfigService>) -> Self {
        Self { registrar, retention, config }
    }
}

#[async_trait]
impl Service for FilesystemService {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn run(&self, mut item: MediaItem) -> Result<ServiceOutcome, ServiceError> {
        self.registrar.register_leaf(&mut item).map_err(|err| ServiceError::fatal(err.to_string()))?;

        let desired: Vec<String> = item.streams.iter().map(|s| s.infohash().to_string()).collect();
        let settings = self.config.current();
        self.retention
            .enforce(&mut item, &desired, |profile| settings.ranking_profile(profile).map_or(1, |p| p.keep_versions_per_item))
            .map_err(|err| ServiceError::fatal(err.to_string()))?;

        Ok(ServiceOutcome::Advance(item))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use riven_config::{ConfigService, default_settings};
    use riven_events::EventBus;
    use riven_media::{Aliases, ExternalIds, ItemKind, MediaEntry, MediaMetadata, ParsedData};
    use riven_vfs::InMemoryVfsHost;
    use uuid::Uuid;

    use super::*;

    fn entry(infohash: &str) -> MediaEntry {
        MediaEntry {
            id: Uuid::new_v4(),
            original_filename: "movie.mkv".into(),
            download_url: "https://example.invalid/f".into(),
            provider: "realdebrid".into(),
            provider_download_id: "1".into(),
            file_size: 10,
            infohash: infohash.into(),
            media_metadata: MediaMetadata { parsed: ParsedData::default(), profile_name: "default".into() },
            library_profiles: vec!["default".into()],
            vfs_paths: vec![],
        }
    }

    fn movie(entries: Vec<MediaEntry>) -> MediaItem {
        MediaItem {
            id: Uuid::new_v4(),
            kind: ItemKind::Movie,
            external_ids: ExternalIds::default(),
            title: "A Movie".into(),
            year: Some(2021),
            aired_at: None,
            country: None,
            is_anime: false,
            parent_id: None,
            number: None,
            absolute_number: None,
            streams: vec![],
            blacklisted_streams: HashSet::new(),
            active_stream: None,
            filesystem_entries: entries,
            aliases: Aliases::default(),
            scraped_at: None,
        }
    }

    fn service() -> FilesystemService {
        let defaults = default_settings();
        let config = Arc::new(ConfigService::load(None, &defaults).expect("config loads from defaults"));
        let host = Arc::new(InMemoryVfsHost::new());
        FilesystemService::new(VfsRegistrar::new(host, EventBus::with_capacity(8)), RetentionEnforcer::new(EventBus::with_capacity(8)), config)
    }

    #[test]
    fn name_identifies_stage() {
        assert_eq!(service().name(), "filesystem");
    }

    #[tokio::test]
    async fn run_registers_and_advances_a_leaf_with_no_excess_versions() {
        let svc = service();
        let infohash = "a".repeat(40);
        let leaf = movie(vec![entry(&infohash)]);
        let leaf_id = leaf.id;

        let outcome = svc.run(leaf).await.expect("run succeeds");
        match outcome {
            ServiceOutcome::Advance(item) => {
                assert_eq!(item.id, leaf_id);
                assert_eq!(item.filesystem_entries.len(), 1);
            }
            _ => panic!("expected Advance"),
        }
    }

    #[tokio::test]
    async fn run_deduplicates_repeated_infohash_profile_pairs_before_retention() {
        let svc = service();
        let infohash = "b".repeat(40);
        let leaf = movie(vec![entry(&infohash), entry(&infohash)]);

        let outcome = svc.run(leaf).await.expect("run succeeds");
        match outcome {
            ServiceOutcome::Advance(item) => assert_eq!(item.filesystem_entries.len(), 1),
            _ => panic!("expected Advance"),
        }
    }
}

//! Builders for the domain types every crate's tests otherwise construct by
//! hand: a bare `MediaItem` and a minimal, valid `Settings` snapshot.

use riven_config::{HarvesterConfig, MetadataConfig, PathProfile, ProvidersConfig, ScrapingConfig, Settings};
use riven_media::{Aliases, ExternalIds, ItemKind, MediaItem, RankingProfile};
use std::collections::HashSet;
use std::path::PathBuf;
use uuid::Uuid;

/// Build a bare `Movie` item titled `title`, indexed with `imdb_id` when
/// given. Every collection field starts empty; callers mutate the result
/// directly for the handful of fields their test cares about.
#[must_use]
pub fn movie_item(title: &str, year: Option<i32>, imdb_id: Option<&str>) -> MediaItem {
    MediaItem {
        id: Uuid::new_v4(),
        kind: ItemKind::Movie,
        external_ids: ExternalIds { imdb_id: imdb_id.map(str::to_string), ..ExternalIds::default() },
        title: title.to_string(),
        year,
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

/// Build a bare `Episode` item under `parent_id`, at `number` within its
/// season.
#[must_use]
pub fn episode_item(parent_id: Uuid, number: u32) -> MediaItem {
    MediaItem { kind: ItemKind::Episode, parent_id: Some(parent_id), number: Some(number), ..movie_item("Episode", None, None) }
}

/// Build a minimal, valid `Settings` snapshot carrying exactly `profile`,
/// used as both its sole ranking profile and its `default_profile`, with a
/// placeholder `mount_path`. Callers needing `path_profiles` routing or
/// multiple profiles extend the returned value directly (every field is
/// public).
#[must_use]
pub fn settings_with_profile(profile: RankingProfile) -> Settings {
    Settings {
        default_profile: profile.name.clone(),
        ranking_profiles: vec![profile],
        path_profiles: Vec::<PathProfile>::new(),
        providers: ProvidersConfig::default(),
        harvester: HarvesterConfig::default(),
        metadata: MetadataConfig::default(),
        scraping: ScrapingConfig::default(),
        symlink_library_path: None,
        mount_path: PathBuf::from("/mnt/riven"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_item_carries_requested_imdb_id() {
        let item = movie_item("Movie", Some(2020), Some("tt1"));
        assert_eq!(item.external_ids.imdb_id.as_deref(), Some("tt1"));
        assert_eq!(item.kind, ItemKind::Movie);
    }

    #[test]
    fn episode_item_links_to_its_parent() {
        let parent = Uuid::new_v4();
        let episode = episode_item(parent, 3);
        assert_eq!(episode.parent_id, Some(parent));
        assert_eq!(episode.number, Some(3));
    }

    #[test]
    fn settings_with_profile_is_self_consistent() {
        let profile = RankingProfile {
            name: "hq".into(),
            languages_include: vec![],
            languages_exclude: vec![],
            remove_all_trash: true,
            bucket_limit: 10,
            keep_versions_per_item: 1,
        };
        let settings = settings_with_profile(profile);
        assert_eq!(settings.default_profile, "hq");
        assert!(settings.ranking_profile("hq").is_some());
    }
}

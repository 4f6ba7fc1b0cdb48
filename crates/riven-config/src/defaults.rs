//! Built-in default settings, used as the base layer under file/env overrides
//! and as the fixture for tests.

use std::path::PathBuf;

use riven_media::RankingProfile;

use crate::model::{HarvesterConfig, MetadataConfig, ProvidersConfig, ScrapingConfig, Settings};

/// A minimal, valid settings snapshot: a single `default` profile and no
/// provider credentials. Real deployments override this via a TOML file
/// and/or `RIVEN_`-prefixed environment variables.
#[must_use]
pub fn default_settings() -> Settings {
    Settings {
        ranking_profiles: vec![RankingProfile {
            name: "default".to_string(),
            languages_include: vec![],
            languages_exclude: vec![],
            remove_all_trash: true,
            bucket_limit: 50,
            keep_versions_per_item: 1,
        }],
        path_profiles: vec![],
        default_profile: "default".to_string(),
        providers: ProvidersConfig::default(),
        harvester: HarvesterConfig::default(),
        metadata: MetadataConfig::default(),
        scraping: ScrapingConfig::default(),
        symlink_library_path: None,
        mount_path: PathBuf::from("/mnt/riven"),
    }
}

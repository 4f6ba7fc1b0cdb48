//! Typed configuration models for an immutable settings snapshot.
//!
//! # Design
//! - Pure data carriers, deserialized once at service start and never
//!   mutated in place; a settings change produces a new [`Settings`] value
//!   and components that care (the VFS host in particular) are notified via
//!   a broadcast `sync()`, not by reaching into a shared mutable global.

use std::path::PathBuf;

use riven_media::RankingProfile;
use serde::{Deserialize, Serialize};

/// A single `path -> profile name` mapping used for longest-prefix lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathProfile {
    /// Library path prefix, e.g. `/library/anime`.
    pub path: String,
    /// Name of the ranking profile materialized under this path.
    pub profile: String,
}

/// Per-provider API credentials for the debrid services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// `RealDebrid` API key, if configured.
    #[serde(default)]
    pub realdebrid_api_key: Option<String>,
    /// Debrid-Link API key, if configured.
    #[serde(default)]
    pub debrid_link_api_key: Option<String>,
    /// `AllDebrid` API key, if configured.
    #[serde(default)]
    pub alldebrid_api_key: Option<String>,
}

/// Credentials for the metadata provider (TMDB) backing the Episode
/// Validator's expected-episode-count lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// TMDB API key, if configured. `None` disables the Episode Validator's
    /// metadata lookup; gap detection is skipped for every season.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,
    /// TMDB API base URL.
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

/// Configuration for the W2P harvester client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// Whether the harvester path is enabled at all.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL, e.g. `https://w2p.example.invalid`.
    #[serde(default)]
    pub base_url: String,
    /// Optional auth header name/value pair.
    #[serde(default)]
    pub auth_header_name: Option<String>,
    /// Optional auth header value.
    #[serde(default)]
    pub auth_header_value: Option<String>,
    /// Per-item request timeout in seconds (spec allows up to 900).
    #[serde(default = "default_harvester_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_harvester_timeout_secs() -> u64 {
    900
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            auth_header_name: None,
            auth_header_value: None,
            timeout_secs: default_harvester_timeout_secs(),
        }
    }
}

/// Scraper fan-in behavior that isn't scoped to a single ranking profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// When set, anime items only accept releases the parser flags as dubbed.
    #[serde(default)]
    pub dubbed_anime_only: bool,
}

/// The full, immutable configuration snapshot for one process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Named ranking profiles available to the scraper fan-in.
    #[serde(default)]
    pub ranking_profiles: Vec<RankingProfile>,
    /// Longest-prefix library-path to profile-name mappings.
    #[serde(default)]
    pub path_profiles: Vec<PathProfile>,
    /// Fallback profile name used when no `path_profiles` entry matches.
    pub default_profile: String,
    /// Debrid provider credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// W2P harvester client configuration.
    #[serde(default)]
    pub harvester: HarvesterConfig,
    /// Metadata provider credentials for the Indexer and Episode Validator.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Scraper fan-in behavior shared across ranking profiles.
    #[serde(default)]
    pub scraping: ScrapingConfig,
    /// Optional symlink library path; when set, leaf MediaEntries are
    /// reflected as symlinks into this tree after VFS registration.
    #[serde(default)]
    pub symlink_library_path: Option<PathBuf>,
    /// Mount path for the virtual filesystem.
    pub mount_path: PathBuf,
}

impl Settings {
    /// Look up the ranking profile named `name`.
    #[must_use]
    pub fn ranking_profile(&self, name: &str) -> Option<&RankingProfile> {
        self.ranking_profiles.iter().find(|p| p.name == name)
    }

    /// The profile for `library_path` via longest-prefix match over
    /// `path_profiles`, falling back to `default_profile`. Uniqueness of
    /// `path_profiles[].path` (enforced at validation time) means ties are
    /// impossible.
    #[must_use]
    pub fn profile_for_path(&self, library_path: &str) -> &str {
        self.path_profiles
            .iter()
            .filter(|p| library_path.starts_with(p.path.as_str()))
            .max_by_key(|p| p.path.len())
            .map_or(self.default_profile.as_str(), |p| p.profile.as_str())
    }
}

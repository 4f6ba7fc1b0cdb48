//! Core media domain types shared across the acquisition pipeline.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// The variant of a `MediaItem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A single film. The default variant, used where a kind must be
    /// supplied but context has not yet been resolved.
    #[default]
    Movie,
    /// A television show (parent of seasons).
    Show,
    /// A season of a show (parent of episodes).
    Season,
    /// A single episode of a season.
    Episode,
}

impl ItemKind {
    /// Leaf items (Movie, Episode) own filesystem entries directly; Show/Season
    /// expand to their leaves.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Movie | Self::Episode)
    }
}

/// External identifiers known for an item. Exactly one non-empty identifier,
/// preferred in `imdb_id > tmdb_id > tvdb_id` order, is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    /// IMDb identifier (e.g. `tt0111161`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// TMDB identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<String>,
    /// TVDB identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<String>,
}

impl ExternalIds {
    /// The first non-empty identifier, in `imdb_id > tmdb_id > tvdb_id` order.
    #[must_use]
    pub fn canonical(&self) -> Option<&str> {
        self.imdb_id
            .as_deref()
            .or(self.tmdb_id.as_deref())
            .or(self.tvdb_id.as_deref())
    }

    /// Whether at least one identifier is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical().is_none()
    }
}

/// A weak reference to the currently promoted release for an item: an
/// `(infohash, provider_torrent_id)` pair, not a pointer. It may transiently
/// reference a non-present entry between download and VFS registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStream {
    /// Infohash of the promoted release.
    pub infohash: String,
    /// Provider-assigned torrent identifier for the promoted release.
    pub provider_torrent_id: String,
}

/// A single harvested release record, as returned by the W2P harvester or
/// attached directly to an item's aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRelease {
    /// Raw release title as reported by the harvester.
    pub raw_title: String,
    /// Infohash, if the harvester resolved one directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infohash: Option<String>,
    /// Magnet URI, used to recover an infohash when none was given directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
    /// Reported size in bytes, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Free-form label describing the release's origin (e.g. `rd-library`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    /// Season number the release is scoped to, when the harvester call was
    /// season- or episode-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
}

/// Free-form per-item bookkeeping carried alongside the typed attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aliases {
    /// Releases pre-resolved by the W2P harvester for this item.
    #[serde(default)]
    pub w2p_releases: Vec<HarvestedRelease>,
    /// Timestamp of the last harvester attempt for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w2p_last_attempt: Option<DateTime<Utc>>,
    /// Number of harvester attempts made, capped at 3 before a 24h cooldown.
    #[serde(default)]
    pub w2p_attempt_count: u8,
    /// Additional free-form keys not modeled explicitly.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Parsed release metadata produced by the ranking engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    /// Title recovered from the raw release title.
    pub title: String,
    /// Year annotation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Season numbers annotated on the release.
    #[serde(default)]
    pub seasons: Vec<u32>,
    /// Episode numbers annotated on the release.
    #[serde(default)]
    pub episodes: Vec<u32>,
    /// Country code annotation, if any (un-normalized).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Whether the release is annotated as dubbed.
    #[serde(default)]
    pub dubbed: bool,
    /// Language tags recognized in the raw title (lower-cased), consulted by
    /// a profile's `languages_exclude` filter.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Free-form quality tags (resolution, codec, source, etc.).
    #[serde(default)]
    pub quality_tags: Vec<String>,
    /// Size in bytes, when reported by the source (harvester releases carry
    /// this; plain scraper titles usually do not).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// A ranked, profile-tagged candidate release attached to an item.
/// Immutable after construction; use [`Stream::new`] to enforce the infohash
/// normalization invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    infohash: String,
    raw_title: String,
    parsed_data: ParsedData,
    rank: i64,
    profile_name: String,
}

impl Stream {
    /// Construct a new stream, validating and normalizing the infohash.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::InvalidInfohash`] if `infohash` is not exactly 40
    /// hex characters after lower-casing.
    pub fn new(
        infohash: impl Into<String>,
        raw_title: impl Into<String>,
        parsed_data: ParsedData,
        rank: i64,
        profile_name: impl Into<String>,
    ) -> MediaResult<Self> {
        let infohash = normalize_infohash(infohash.into())?;
        Ok(Self {
            infohash,
            raw_title: raw_title.into(),
            parsed_data,
            rank,
            profile_name: profile_name.into(),
        })
    }

    /// The normalized (lower-hex, 40-char) infohash.
    #[must_use]
    pub fn infohash(&self) -> &str {
        &self.infohash
    }

    /// The raw release title as seen by the ranking engine.
    #[must_use]
    pub fn raw_title(&self) -> &str {
        &self.raw_title
    }

    /// Parsed metadata for this release.
    #[must_use]
    pub const fn parsed_data(&self) -> &ParsedData {
        &self.parsed_data
    }

    /// Integer quality rank; higher is better.
    #[must_use]
    pub const fn rank(&self) -> i64 {
        self.rank
    }

    /// Ranking profile this stream was selected under.
    #[must_use]
    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// Size in bytes, when known (harvester releases carry this; plain
    /// scraper titles usually do not).
    #[must_use]
    pub const fn size_bytes_hint(&self) -> u64 {
        match self.parsed_data.size_bytes {
            Some(size) => size,
            None => 0,
        }
    }
}

/// Normalize an infohash to 40 lower-hex characters, rejecting anything else.
///
/// # Errors
///
/// Returns [`MediaError::InvalidInfohash`] when the value is not 40
/// characters of hex after lower-casing.
pub fn normalize_infohash(value: impl Into<String>) -> MediaResult<String> {
    let value = value.into();
    let lowered = value.to_ascii_lowercase();
    if lowered.len() == 40 && lowered.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(lowered)
    } else {
        Err(MediaError::InvalidInfohash { value })
    }
}

/// Metadata carried by a filesystem record: the parsed release data plus the
/// ranking profile it was materialized for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Parsed release metadata.
    pub parsed: ParsedData,
    /// Ranking profile name this entry belongs to.
    pub profile_name: String,
}

/// A concrete file available via a debrid provider, bound to a leaf item and
/// a ranking profile. The VFS host is the source of truth for `vfs_paths`;
/// this record is the source of truth for file identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Identity of this entry, stable across retention passes.
    pub id: Uuid,
    /// Original filename as reported by the debrid provider.
    pub original_filename: String,
    /// Provider-signed download URL; may expire.
    pub download_url: String,
    /// Debrid provider name that produced this entry.
    pub provider: String,
    /// Provider-assigned download/torrent identifier.
    pub provider_download_id: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Lower-case 40-hex infohash of the source torrent.
    pub infohash: String,
    /// Parsed metadata and profile tag.
    pub media_metadata: MediaMetadata,
    /// Library layouts (profiles) this entry is materialized under.
    #[serde(default)]
    pub library_profiles: Vec<String>,
    /// Virtual paths derived by the VFS host at registration time.
    #[serde(default)]
    pub vfs_paths: Vec<String>,
}

impl MediaEntry {
    /// The `(infohash, profile_name)` dedup key for this entry, treating an
    /// absent or empty profile name as equal to `None`.
    #[must_use]
    pub fn dedup_key(&self) -> (String, Option<String>) {
        let profile = &self.media_metadata.profile_name;
        let profile = if profile.is_empty() {
            None
        } else {
            Some(profile.clone())
        };
        (self.infohash.clone(), profile)
    }
}

/// A file entry inside a `TorrentContainer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerFile {
    /// Filename as reported by the provider.
    pub filename: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Provider-assigned file identifier, used for file selection.
    pub file_id: String,
}

/// Aggregate size/file-count summary for a `TorrentContainer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Total size in bytes across all files.
    pub size_bytes: u64,
    /// Number of files in the container.
    pub file_count: usize,
}

/// The file layout of a torrent as reported by a debrid service during
/// instant-availability validation. May be *pre-validated*: a probe added to
/// the provider but not yet selected for download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentContainer {
    /// Infohash of the torrent.
    pub infohash: String,
    /// Provider-assigned torrent identifier.
    pub torrent_id: String,
    /// Aggregate size/file-count summary.
    pub torrent_info: TorrentInfo,
    /// Individual files in the container.
    pub files: Vec<ContainerFile>,
    /// Whether this container was produced purely for pre-validation and has
    /// not yet been committed to (file-selected) by the caller.
    #[serde(default)]
    pub pre_validated: bool,
}

impl TorrentContainer {
    /// Median file size across `files`, falling back to the total size when
    /// per-file sizes are unavailable (zero files).
    #[must_use]
    pub fn median_file_size(&self) -> u64 {
        if self.files.is_empty() {
            return self.torrent_info.size_bytes;
        }
        let mut sizes: Vec<u64> = self.files.iter().map(|f| f.size_bytes).collect();
        sizes.sort_unstable();
        let mid = sizes.len() / 2;
        if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) / 2
        } else {
            sizes[mid]
        }
    }
}

/// A named configuration controlling the ranking engine's parsing filters and
/// quality ranking for one target audience (e.g. `hq`, `mobile`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingProfile {
    /// Profile name, unique within a configuration snapshot.
    pub name: String,
    /// Aliases/languages to include when scoring.
    #[serde(default)]
    pub languages_include: Vec<String>,
    /// Languages to exclude from alias matching.
    #[serde(default)]
    pub languages_exclude: Vec<String>,
    /// Whether to drop releases the parser flags as low-quality/trash.
    #[serde(default)]
    pub remove_all_trash: bool,
    /// Maximum candidates kept per quality bucket before ranking.
    pub bucket_limit: usize,
    /// Number of MediaEntries to retain per item under this profile.
    pub keep_versions_per_item: u32,
}

/// A media item: Movie, Show, Season, or Episode. Parent/child relations are
/// by id (arena-style); only leaf items (Movie, Episode) own
/// `filesystem_entries` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Stable identifier for this item.
    pub id: Uuid,
    /// The item's variant.
    pub kind: ItemKind,
    /// External identifiers; at least one must be present after indexing.
    #[serde(default)]
    pub external_ids: ExternalIds,
    /// Display title.
    pub title: String,
    /// Release/air year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Air date, used for the ranking engine's year-match window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aired_at: Option<DateTime<Utc>>,
    /// Country of origin (un-normalized; normalize at use sites).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Whether this item is anime (enables absolute numbering and dubbed-only
    /// filtering).
    #[serde(default)]
    pub is_anime: bool,
    /// Parent item id (`Show` for `Season`, `Season` for `Episode`). `None`
    /// for `Movie` and `Show`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Season number (Season items) or episode number within season (Episode
    /// items). `None` for Movie/Show.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Absolute episode number across the whole show, honored for anime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_number: Option<u32>,
    /// Ranked, profile-tagged candidate releases.
    #[serde(default)]
    pub streams: Vec<Stream>,
    /// Infohashes that must never be retried for this item.
    #[serde(default)]
    pub blacklisted_streams: HashSet<String>,
    /// Currently promoted release, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_stream: Option<ActiveStream>,
    /// Filesystem entries. Populated only on leaf items.
    #[serde(default)]
    pub filesystem_entries: Vec<MediaEntry>,
    /// Free-form bookkeeping (harvester state, etc).
    #[serde(default)]
    pub aliases: Aliases,
    /// Last time streams were (re)computed; `None` forces a re-scrape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// The authoritative external identifier, or `None` before indexing.
    #[must_use]
    pub fn canonical_id(&self) -> Option<&str> {
        self.external_ids.canonical()
    }

    /// Add a stream, rejecting it if its infohash is already blacklisted.
    ///
    /// # Errors
    ///
    /// This never fails today but returns `MediaResult` to leave room for
    /// future validation without breaking callers.
    pub fn add_stream(&mut self, stream: Stream) -> MediaResult<()> {
        if self.blacklisted_streams.contains(stream.infohash()) {
            return Ok(());
        }
        self.streams.push(stream);
        Ok(())
    }

    /// Blacklist an infohash, permanently excluding it from future streams.
    pub fn blacklist_stream(&mut self, infohash: &str) {
        self.blacklisted_streams.insert(infohash.to_string());
        self.streams.retain(|s| s.infohash() != infohash);
    }

    /// Whether the item has at least one non-blacklisted stream.
    #[must_use]
    pub fn has_scraped_streams(&self) -> bool {
        !self.streams.is_empty()
    }

    /// Whether this leaf has at least one entry visible under the library
    /// path (the `Symlinked`/`Completed` derived state for a leaf item).
    #[must_use]
    pub fn has_symlinked_entry(&self) -> bool {
        self.filesystem_entries
            .iter()
            .any(|entry| !entry.vfs_paths.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_parsed() -> ParsedData {
        ParsedData {
            title: "Example".into(),
            ..ParsedData::default()
        }
    }

    #[test]
    fn stream_normalizes_infohash_case() {
        let stream = Stream::new(
            "A".repeat(40),
            "raw",
            sample_parsed(),
            10,
            "hq",
        )
        .expect("valid infohash");
        assert_eq!(stream.infohash(), "a".repeat(40));
    }

    #[test]
    fn stream_rejects_wrong_length_infohash() {
        let err = Stream::new("abc", "raw", sample_parsed(), 0, "hq").unwrap_err();
        assert!(matches!(err, MediaError::InvalidInfohash { .. }));
    }

    #[test]
    fn external_ids_prefer_imdb_over_others() {
        let ids = ExternalIds {
            imdb_id: Some("tt1".into()),
            tmdb_id: Some("1399".into()),
            tvdb_id: None,
        };
        assert_eq!(ids.canonical(), Some("tt1"));
    }

    #[test]
    fn media_entry_dedup_key_treats_empty_profile_as_none() {
        let entry = MediaEntry {
            id: Uuid::nil(),
            original_filename: "f.mkv".into(),
            download_url: "https://example.invalid/f".into(),
            provider: "realdebrid".into(),
            provider_download_id: "1".into(),
            file_size: 10,
            infohash: "a".repeat(40),
            media_metadata: MediaMetadata::default(),
            library_profiles: vec![],
            vfs_paths: vec![],
        };
        assert_eq!(entry.dedup_key(), ("a".repeat(40), None));
    }

    #[test]
    fn blacklisting_removes_existing_stream_and_future_adds_are_noops() {
        let mut item = MediaItem {
            id: Uuid::nil(),
            kind: ItemKind::Movie,
            external_ids: ExternalIds::default(),
            title: "Title".into(),
            year: None,
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
        };
        let infohash = "b".repeat(40);
        let stream = Stream::new(infohash.clone(), "raw", sample_parsed(), 1, "hq").unwrap();
        item.add_stream(stream).unwrap();
        assert!(item.has_scraped_streams());
        item.blacklist_stream(&infohash);
        assert!(!item.has_scraped_streams());

        let stream_again = Stream::new(infohash, "raw", sample_parsed(), 1, "hq").unwrap();
        item.add_stream(stream_again).unwrap();
        assert!(
            !item.has_scraped_streams(),
            "blacklisted infohash must never be reconsidered"
        );
    }

    #[test]
    fn median_file_size_falls_back_to_total_when_files_absent() {
        let container = TorrentContainer {
            infohash: "c".repeat(40),
            torrent_id: "t1".into(),
            torrent_info: TorrentInfo {
                size_bytes: 900,
                file_count: 0,
            },
            files: vec![],
            pre_validated: false,
        };
        assert_eq!(container.median_file_size(), 900);
    }

    #[test]
    fn median_file_size_uses_middle_value_for_odd_count() {
        let container = TorrentContainer {
            infohash: "d".repeat(40),
            torrent_id: "t1".into(),
            torrent_info: TorrentInfo::default(),
            files: vec![
                ContainerFile {
                    filename: "a".into(),
                    size_bytes: 100,
                    file_id: "1".into(),
                },
                ContainerFile {
                    filename: "b".into(),
                    size_bytes: 300,
                    file_id: "2".into(),
                },
                ContainerFile {
                    filename: "c".into(),
                    size_bytes: 200,
                    file_id: "3".into(),
                },
            ],
            pre_validated: false,
        };
        assert_eq!(container.median_file_size(), 200);
    }
}

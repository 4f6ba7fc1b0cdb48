//! Scraper fan-in: merges scraper results, ranks them per profile, applies
//! item-context filters, and selects the top-N distinct streams per profile.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use riven_media::{ItemKind, MediaItem, ParsedData, RankingProfile, Stream};
use thiserror::Error;
use tracing::{debug, trace};

use crate::engine::{quality_bucket, rank};
use crate::parser::normalize_title_text;

/// Error surfaced by an individual scraper; fan-in treats these as "no
/// results from this scraper" and continues with the others.
#[derive(Debug, Error, Clone)]
#[error("scraper {scraper} failed: {message}")]
pub struct ScrapeError {
    /// Name of the scraper that failed.
    pub scraper: String,
    /// Human-readable failure detail.
    pub message: String,
}

/// Result alias for scraper implementations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// A release source queried by the fan-in. Each scraper contributes a
/// mapping of `infohash -> raw_title`.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Human-readable scraper name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Query this scraper for candidate releases for `item`.
    async fn scrape(&self, item: &MediaItem) -> ScrapeResult<HashMap<String, String>>;
}

static BTIH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)btih:([0-9a-f]{32,40})").expect("valid regex"));

/// The "harvested releases" pseudo-scraper: surfaces W2P releases already
/// attached to the item via `aliases.w2p_releases`, recovering an infohash
/// from the magnet URI when the harvester didn't resolve one directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct HarvestedReleasesScraper;

#[async_trait]
impl Scraper for HarvestedReleasesScraper {
    fn name(&self) -> &str {
        "harvested_releases"
    }

    async fn scrape(&self, item: &MediaItem) -> ScrapeResult<HashMap<String, String>> {
        let mut out = HashMap::new();
        for release in &item.aliases.w2p_releases {
            let infohash = release
                .infohash
                .clone()
                .or_else(|| extract_btih(release.magnet.as_deref()?));
            let Some(infohash) = infohash else {
                trace!(raw_title = %release.raw_title, "harvested release missing infohash and magnet");
                continue;
            };
            let title = normalize_title_text(&release.raw_title);
            out.insert(infohash.to_ascii_lowercase(), title);
        }
        Ok(out)
    }
}

/// Extract a `btih:<40-hex>` infohash from a magnet URI.
#[must_use]
pub fn extract_btih(magnet: &str) -> Option<String> {
    BTIH.captures(magnet)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Item-context facts the fan-in's context filters need, resolved by the
/// caller from the full item tree (the fan-in itself only sees one item at a
/// time and does not own a repository).
#[derive(Debug, Clone, Default)]
pub struct ItemContext {
    /// The item's variant.
    pub kind: ItemKind,
    /// Season number (Season items) or episode number within season (Episode
    /// items).
    pub number: Option<u32>,
    /// Absolute episode number, honored for anime.
    pub absolute_number: Option<u32>,
    /// For Episode items, the parent Season's number.
    pub parent_season_number: Option<u32>,
    /// For Show items, every season number it owns.
    pub season_numbers: Vec<u32>,
    /// For Season items, every episode number it owns.
    pub episode_numbers: Vec<u32>,
    /// Normalized country of the item (already `USA->US`, `GB->UK`).
    pub country: Option<String>,
    /// Air year of the item.
    pub aired_year: Option<i32>,
    /// Whether the item is anime.
    pub is_anime: bool,
    /// Whether dubbed-only mode is enabled for anime.
    pub dubbed_anime_only: bool,
}

/// Normalize a torrent-title country code to the same two-letter form used
/// on items (`USA` -> `US`, `GB` -> `UK`). Unrecognized values pass through
/// unchanged.
fn normalize_country(raw: &str) -> &str {
    match raw.to_ascii_uppercase().as_str() {
        "USA" => "US",
        "GB" => "UK",
        _ => raw,
    }
}

/// Apply the per-kind context filters from the component design. Returns
/// `true` if the release should be kept.
#[must_use]
pub fn context_allows(ctx: &ItemContext, parsed: &ParsedData) -> bool {
    if !kind_allows(ctx, parsed) {
        return false;
    }
    if let Some(country) = &parsed.country {
        if !ctx.is_anime {
            let expected = ctx.country.as_deref().unwrap_or_default();
            if !normalize_country(country).eq_ignore_ascii_case(expected) {
                return false;
            }
        }
    }
    if let Some(year) = parsed.year {
        if let Some(aired) = ctx.aired_year {
            if (year - aired).abs() > 1 {
                return false;
            }
        }
    }
    if ctx.is_anime && ctx.dubbed_anime_only && !parsed.dubbed {
        return false;
    }
    true
}

fn kind_allows(ctx: &ItemContext, parsed: &ParsedData) -> bool {
    match ctx.kind {
        ItemKind::Movie => parsed.episodes.is_empty() && parsed.seasons.is_empty(),
        ItemKind::Show => show_allows(ctx, parsed),
        ItemKind::Season => season_allows(ctx, parsed),
        ItemKind::Episode => episode_allows(ctx, parsed),
    }
}

fn show_allows(ctx: &ItemContext, parsed: &ParsedData) -> bool {
    if !parsed.episodes.is_empty() && parsed.episodes.len() <= 2 {
        return false;
    }
    if !ctx
        .season_numbers
        .iter()
        .all(|s| parsed.seasons.contains(s))
    {
        return false;
    }
    if !parsed.episodes.is_empty()
        && parsed.seasons.is_empty()
        && ctx.season_numbers.len() == 1
        && !ctx
            .episode_numbers
            .iter()
            .all(|e| parsed.episodes.contains(e))
    {
        return false;
    }
    true
}

fn season_allows(ctx: &ItemContext, parsed: &ParsedData) -> bool {
    let Some(season_number) = ctx.number else {
        return false;
    };
    if !parsed.seasons.contains(&season_number) {
        return false;
    }
    if !parsed.episodes.is_empty() {
        if parsed.episodes.len() <= 2 {
            return false;
        }
        if !ctx
            .episode_numbers
            .iter()
            .all(|e| parsed.episodes.contains(e))
        {
            return false;
        }
    }
    true
}

fn episode_allows(ctx: &ItemContext, parsed: &ParsedData) -> bool {
    if !parsed.episodes.is_empty() {
        let number_matches = ctx.number.is_some_and(|n| parsed.episodes.contains(&n));
        let absolute_matches = ctx
            .absolute_number
            .is_some_and(|n| parsed.episodes.contains(&n));
        return number_matches || absolute_matches;
    }
    if !parsed.seasons.is_empty() {
        return ctx
            .parent_season_number
            .is_some_and(|n| parsed.seasons.contains(&n));
    }
    false
}

/// Bucket, cap, and rank-sort a set of ranked streams for one profile.
/// Ties break on descending size, then lexicographic raw title.
#[must_use]
pub fn bucket_and_sort(mut streams: Vec<Stream>, bucket_limit: usize) -> Vec<Stream> {
    let mut buckets: HashMap<&'static str, Vec<Stream>> = HashMap::new();
    streams.sort_by(|a, b| b.rank().cmp(&a.rank()));
    for stream in streams {
        let bucket = quality_bucket(stream.parsed_data());
        let entry = buckets.entry(bucket).or_default();
        if entry.len() < bucket_limit {
            entry.push(stream);
        }
    }
    let mut flattened: Vec<Stream> = buckets.into_values().flatten().collect();
    flattened.sort_by(|a, b| {
        b.rank()
            .cmp(&a.rank())
            .then_with(|| b.size_bytes_hint().cmp(&a.size_bytes_hint()))
            .then_with(|| a.raw_title().cmp(b.raw_title()))
    });
    flattened
}

/// Run every scraper in parallel and merge into one `infohash -> raw_title`
/// map. Individual scraper failures are logged and skipped.
pub async fn merge_scraper_results(
    item: &MediaItem,
    scrapers: &[Arc<dyn Scraper>],
) -> HashMap<String, String> {
    let futures = scrapers.iter().map(|scraper| {
        let scraper = Arc::clone(scraper);
        async move { (scraper.name().to_string(), scraper.scrape(item).await) }
    });
    let results = futures_util::future::join_all(futures).await;

    let mut merged = HashMap::new();
    for (name, result) in results {
        match result {
            Ok(map) => {
                debug!(scraper = %name, count = map.len(), "scraper returned results");
                for (infohash, raw_title) in map {
                    merged.entry(infohash).or_insert(raw_title);
                }
            }
            Err(err) => debug!(scraper = %name, error = %err, "scraper failed"),
        }
    }
    merged
}

/// Rank, filter, bucket, and select the top-N distinct streams for `item`
/// across the given `profiles`, in profile order. Returns the concatenated
/// per-profile selections, preserving profile order, plus the count of
/// infohashes dropped as cross-profile duplicates.
#[must_use]
pub fn rank_and_select(
    merged: &HashMap<String, String>,
    ctx: &ItemContext,
    profiles: &[(String, RankingProfile)],
) -> (Vec<Stream>, usize) {
    let mut combined = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut duplicates = 0usize;

    for (profile_name, profile) in profiles {
        let mut ranked = Vec::new();
        for (infohash, raw_title) in merged {
            match rank(raw_title, infohash, profile, profile_name) {
                Ok(stream) => {
                    if context_allows(ctx, stream.parsed_data()) {
                        ranked.push(stream);
                    }
                }
                Err(err) => trace!(%infohash, error = %err, "dropping garbage torrent"),
            }
        }

        let sorted = bucket_and_sort(ranked, profile.bucket_limit);
        let mut added = 0u32;
        for stream in sorted {
            if added >= profile.keep_versions_per_item {
                break;
            }
            if taken.contains(stream.infohash()) {
                duplicates += 1;
                continue;
            }
            taken.insert(stream.infohash().to_string());
            combined.push(stream);
            added += 1;
        }
    }

    (combined, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_media::HarvestedRelease;

    fn profile(keep_versions: u32) -> RankingProfile {
        RankingProfile {
            name: "hq".into(),
            languages_include: vec![],
            languages_exclude: vec![],
            remove_all_trash: false,
            bucket_limit: 10,
            keep_versions_per_item: keep_versions,
        }
    }

    fn movie_ctx() -> ItemContext {
        ItemContext {
            kind: ItemKind::Movie,
            aired_year: Some(1994),
            country: Some("US".into()),
            ..ItemContext::default()
        }
    }

    #[test]
    fn extracts_btih_from_magnet() {
        let magnet = "magnet:?xt=urn:btih:AAAABBBBCCCCDDDDEEEEFFFFAAAABBBBCCCCDDDD&dn=test";
        assert_eq!(
            extract_btih(magnet),
            Some("aaaabbbbccccddddeeeeffffaaaabbbbccccdddd".to_string())
        );
    }

    #[test]
    fn movie_rejects_torrents_with_episode_annotations() {
        let parsed = ParsedData {
            episodes: vec![1, 2],
            ..ParsedData::default()
        };
        assert!(!context_allows(&movie_ctx(), &parsed));
    }

    #[test]
    fn country_usa_matches_us_after_normalization() {
        let parsed = ParsedData {
            country: Some("USA".into()),
            year: Some(1994),
            ..ParsedData::default()
        };
        assert!(context_allows(&movie_ctx(), &parsed));
    }

    #[test]
    fn year_mismatch_by_one_is_accepted_by_two_is_rejected() {
        let mut ctx = movie_ctx();
        ctx.aired_year = Some(2000);
        let near = ParsedData {
            year: Some(2001),
            ..ParsedData::default()
        };
        let far = ParsedData {
            year: Some(2002),
            ..ParsedData::default()
        };
        assert!(context_allows(&ctx, &near));
        assert!(!context_allows(&ctx, &far));
    }

    #[test]
    fn rank_and_select_keeps_top_n_and_counts_cross_profile_duplicates() {
        let mut merged = HashMap::new();
        merged.insert(
            "a".repeat(40),
            "Movie.Name.1994.1080p.BluRay.x264".to_string(),
        );
        merged.insert("b".repeat(40), "Movie.Name.1994.720p.WEB-DL".to_string());

        let profiles = vec![
            ("hq".to_string(), profile(1)),
            ("mobile".to_string(), profile(1)),
        ];
        let (selected, duplicates) = rank_and_select(&merged, &movie_ctx(), &profiles);
        assert_eq!(selected.len(), 2);
        assert_eq!(duplicates, 0);
        assert_eq!(selected[0].profile_name(), "hq");
        assert_eq!(selected[1].profile_name(), "mobile");
    }

    #[tokio::test]
    async fn harvested_releases_scraper_extracts_infohash_from_magnet() {
        let mut item = MediaItem {
            id: uuid::Uuid::nil(),
            kind: ItemKind::Movie,
            external_ids: riven_media::ExternalIds::default(),
            title: "Movie".into(),
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
            aliases: riven_media::Aliases::default(),
            scraped_at: None,
        };
        item.aliases.w2p_releases.push(HarvestedRelease {
            raw_title: "Movie Name 2023\nextra line".into(),
            infohash: None,
            magnet: Some(
                "magnet:?xt=urn:btih:AAAABBBBCCCCDDDDEEEEFFFFAAAABBBBCCCCDDDD".into(),
            ),
            size_bytes: Some(1_000),
            source_label: None,
            season: None,
        });

        let scraper = HarvestedReleasesScraper;
        let results = scraper.scrape(&item).await.expect("scrape ok");
        assert_eq!(results.len(), 1);
        let (infohash, title) = results.into_iter().next().expect("one result");
        assert_eq!(infohash, "aaaabbbbccccddddeeeeffffaaaabbbbccccdddd");
        assert_eq!(title, "Movie Name 2023");
    }
}

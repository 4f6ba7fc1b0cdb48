//! Release title parsing: raw scene/release titles to [`ParsedData`].
//!
//! This is a small heuristic parser, not a full release-name grammar. It
//! recognizes the handful of signals the ranking engine and context filters
//! need: season/episode numbering, year, country, dub status, and a coarse
//! quality tag + trash classification.

use once_cell::sync::Lazy;
use regex::Regex;
use riven_media::ParsedData;

static SEASON_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})(?:-S?(\d{1,2}))?\b").expect("valid regex"));
static EPISODE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bE(\d{1,3})(?:-E?(\d{1,3}))?\b").expect("valid regex"));
static COMBINED_SXXEXX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})E(\d{1,3})\b").expect("valid regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid regex"));
static COUNTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(USA|US|UK|GB|AU|NZ)\b").expect("valid regex"));
static QUALITY_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(2160p|1080p|720p|480p|bluray|web-?dl|webrip|hdtv|remux|hdr10?|x264|x265|hevc|av1)\b")
        .expect("valid regex")
});
static TRASH_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(cam|hdcam|ts|telesync|workprint|r5|screener|scr)\b").expect("valid regex")
});
static DUBBED_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(dubbed|dual[- ]?audio|dual)\b").expect("valid regex"));
static LANGUAGE_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(multi|french|truefrench|vostfr|german|spanish|italian|russian|japanese|korean|hindi|portuguese|dutch|polish|swedish|turkish|arabic)\b",
    )
    .expect("valid regex")
});

/// Parse a raw release title into structured metadata.
///
/// Multi-line titles (as harvested releases sometimes carry, with a comment
/// trailing the actual title on a later line) are truncated to their first
/// line before parsing, matching the normalization applied when harvested
/// releases are merged into the scraper fan-in.
#[must_use]
pub fn parse_release_title(raw_title: &str) -> ParsedData {
    let first_line = normalize_title_text(raw_title);

    let mut seasons = Vec::new();
    let mut episodes = Vec::new();

    if let Some(caps) = COMBINED_SXXEXX.captures(&first_line) {
        if let Some(s) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            seasons.push(s);
        }
        if let Some(e) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
            episodes.push(e);
        }
    } else {
        if let Some(caps) = SEASON_RANGE.captures(&first_line) {
            push_range(&mut seasons, &caps);
        }
        if let Some(caps) = EPISODE_RANGE.captures(&first_line) {
            push_range(&mut episodes, &caps);
        }
    }

    let year = YEAR
        .find(&first_line)
        .and_then(|m| m.as_str().parse::<i32>().ok());
    let country = COUNTRY
        .find(&first_line)
        .map(|m| m.as_str().to_ascii_uppercase());
    let dubbed = DUBBED_TOKENS.is_match(&first_line);
    let languages = LANGUAGE_TOKENS
        .find_iter(&first_line)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();
    let quality_tags = QUALITY_TOKENS
        .find_iter(&first_line)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();

    let title = derive_title(&first_line);

    ParsedData {
        title,
        year,
        seasons,
        episodes,
        country,
        dubbed,
        languages,
        quality_tags,
        size_bytes: None,
    }
}

/// Whether a title should be treated as trash under `remove_all_trash`.
#[must_use]
pub fn is_trash(raw_title: &str) -> bool {
    TRASH_TOKENS.is_match(raw_title)
}

/// Strip non-ASCII characters, collapse whitespace, and keep only the first
/// line of a (possibly multi-line) harvested release title.
#[must_use]
pub fn normalize_title_text(raw_title: &str) -> String {
    let first_line = raw_title.lines().next().unwrap_or_default();
    let ascii_only: String = first_line.chars().filter(char::is_ascii).collect();
    ascii_only.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_range(out: &mut Vec<u32>, caps: &regex::Captures<'_>) {
    let start = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let end = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
    match (start, end) {
        (Some(start), Some(end)) if end >= start => out.extend(start..=end),
        (Some(start), _) => out.push(start),
        _ => {}
    }
}

fn derive_title(normalized: &str) -> String {
    let cut_at = [&SEASON_RANGE, &EPISODE_RANGE, &COMBINED_SXXEXX, &YEAR]
        .iter()
        .filter_map(|re| re.find(normalized).map(|m| m.start()))
        .min();
    let title_part = cut_at.map_or(normalized, |idx| &normalized[..idx]);
    title_part
        .replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

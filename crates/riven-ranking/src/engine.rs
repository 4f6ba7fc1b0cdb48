//! Ranking engine: scores a raw release title against a ranking profile.
//!
//! Ranking is deterministic and depends only on the profile's settings, not
//! on any item context — context filtering happens one layer up, in the
//! scraper fan-in (`crate::fanin`).

use riven_media::{ParsedData, RankingProfile, Stream};
use thiserror::Error;

use crate::parser::{is_trash, parse_release_title};

/// A release rejected by the ranking engine before it could become a Stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RankError {
    /// The release matched a known low-quality/trash pattern under a profile
    /// with `remove_all_trash` enabled.
    #[error("garbage torrent: {reason}")]
    Garbage {
        /// Human-readable rejection reason, for trace-level logging.
        reason: String,
    },
    /// The infohash failed normalization.
    #[error("invalid infohash")]
    InvalidInfohash,
    /// The release carries a language the profile's `languages_exclude`
    /// rejects.
    #[error("excluded language: {language}")]
    ExcludedLanguage {
        /// The offending language tag recognized in the title.
        language: String,
    },
}

const QUALITY_WEIGHTS: &[(&str, i64)] = &[
    ("2160p", 400),
    ("1080p", 300),
    ("720p", 200),
    ("480p", 100),
    ("remux", 150),
    ("bluray", 80),
    ("web-dl", 60),
    ("webrip", 40),
    ("hdtv", 10),
    ("hdr10", 20),
    ("hdr", 20),
    ("x265", 15),
    ("hevc", 15),
    ("x264", 5),
    ("av1", 15),
];

/// Score a parsed release's quality tags into an integer rank; higher is
/// better. Unrecognized tags contribute nothing.
#[must_use]
pub fn score_quality(parsed: &ParsedData) -> i64 {
    parsed
        .quality_tags
        .iter()
        .filter_map(|tag| {
            QUALITY_WEIGHTS
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(tag))
                .map(|(_, weight)| *weight)
        })
        .sum()
}

/// The coarse quality bucket a release falls into, used to cap how many
/// candidates of a given resolution tier are considered per profile.
#[must_use]
pub fn quality_bucket(parsed: &ParsedData) -> &'static str {
    for tag in &parsed.quality_tags {
        match tag.as_str() {
            "2160p" => return "2160p",
            "1080p" => return "1080p",
            "720p" => return "720p",
            "480p" => return "480p",
            _ => {}
        }
    }
    "unknown"
}

/// Parse and score `raw_title` under `profile`, producing a `Stream` or
/// rejecting it as garbage.
///
/// # Errors
///
/// Returns [`RankError::Garbage`] when the profile's `remove_all_trash` is
/// set and the title matches a known trash pattern, [`RankError::ExcludedLanguage`]
/// when the profile's `languages_exclude` names a language recognized in the
/// title, and [`RankError::InvalidInfohash`] when the infohash fails
/// normalization.
pub fn rank(
    raw_title: &str,
    infohash: &str,
    profile: &RankingProfile,
    profile_name: &str,
) -> Result<Stream, RankError> {
    if profile.remove_all_trash && is_trash(raw_title) {
        return Err(RankError::Garbage {
            reason: format!("matched trash pattern: {raw_title}"),
        });
    }

    let parsed = parse_release_title(raw_title);

    if let Some(excluded) = parsed
        .languages
        .iter()
        .find(|language| profile.languages_exclude.iter().any(|excluded| excluded.eq_ignore_ascii_case(language)))
    {
        return Err(RankError::ExcludedLanguage { language: excluded.clone() });
    }

    let rank_score = score_quality(&parsed);

    Stream::new(infohash, raw_title, parsed, rank_score, profile_name)
        .map_err(|_| RankError::InvalidInfohash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(remove_all_trash: bool) -> RankingProfile {
        RankingProfile {
            name: "hq".into(),
            languages_include: vec![],
            languages_exclude: vec![],
            remove_all_trash,
            bucket_limit: 5,
            keep_versions_per_item: 1,
        }
    }

    #[test]
    fn excluded_language_is_rejected() {
        let infohash = "d".repeat(40);
        let mut p = profile(false);
        p.languages_exclude = vec!["french".to_string()];
        let result = rank("Movie.Name.2023.FRENCH.1080p.BluRay", &infohash, &p, "hq");
        assert!(matches!(result, Err(RankError::ExcludedLanguage { .. })));
    }

    #[test]
    fn language_not_in_exclude_list_is_ranked() {
        let infohash = "e".repeat(40);
        let mut p = profile(false);
        p.languages_exclude = vec!["german".to_string()];
        assert!(rank("Movie.Name.2023.FRENCH.1080p.BluRay", &infohash, &p, "hq").is_ok());
    }

    #[test]
    fn rank_is_deterministic_for_fixed_inputs() {
        let title = "Movie.Name.2023.1080p.BluRay.x264";
        let infohash = "a".repeat(40);
        let a = rank(title, &infohash, &profile(false), "hq").expect("ranked");
        let b = rank(title, &infohash, &profile(false), "hq").expect("ranked");
        assert_eq!(a.rank(), b.rank());
        assert_eq!(a.infohash(), b.infohash());
    }

    #[test]
    fn higher_resolution_scores_higher() {
        let infohash = "b".repeat(40);
        let p = profile(false);
        let hd = rank("Movie.2023.1080p.BluRay", &infohash, &p, "hq").unwrap();
        let sd = rank("Movie.2023.480p.HDTV", &infohash, &p, "hq").unwrap();
        assert!(hd.rank() > sd.rank());
    }

    #[test]
    fn trash_is_rejected_only_when_profile_enables_it() {
        let infohash = "c".repeat(40);
        let trash_title = "Movie.2023.CAM.XViD";
        assert!(rank(trash_title, &infohash, &profile(true), "hq").is_err());
        assert!(rank(trash_title, &infohash, &profile(false), "hq").is_ok());
    }
}

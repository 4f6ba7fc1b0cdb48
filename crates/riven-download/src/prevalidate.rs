//! High-quality profile pre-validation: probes up to 5 pending candidates
//! across providers ahead of the main attempt loop and re-sorts them so the
//! attempt loop tries the best-looking release first.

use std::cmp::Reverse;
use std::sync::Arc;

use riven_debrid::DebridProvider;
use riven_media::{ItemKind, MediaItem, Stream, TorrentContainer};

/// One successfully-probed candidate, still carrying the container the
/// provider produced (a probe that must be cleaned up if never selected).
#[derive(Debug, Clone)]
pub struct PrevalidatedCandidate {
    /// Infohash of the probed release.
    pub infohash: String,
    /// Name of the provider that produced the probe.
    pub provider: String,
    /// The container returned by `instant_availability`.
    pub container: TorrentContainer,
}

/// Probe up to the first 5 of `pending_streams` across `providers`, then
/// sort the results by (matches target season, single-season ahead of
/// packs, descending median file size). Only called when the first pending
/// stream's profile is `hq` and at least two streams are pending.
pub async fn prevalidate_hq_candidates(
    item: &MediaItem,
    pending_streams: &[Stream],
    providers: &[Arc<dyn DebridProvider>],
) -> Vec<PrevalidatedCandidate> {
    let Some(first) = pending_streams.first() else {
        return Vec::new();
    };
    if first.profile_name() != "hq" || pending_streams.len() < 2 {
        return Vec::new();
    }

    let target_season = (item.kind == ItemKind::Season).then_some(item.number).flatten();

    let mut candidates = Vec::new();
    for stream in pending_streams.iter().take(5) {
        for provider in providers {
            if !provider.initialized() {
                continue;
            }
            if let Ok(Some(container)) = provider.instant_availability(stream.infohash(), item.kind).await {
                candidates.push(PrevalidatedCandidate {
                    infohash: stream.infohash().to_string(),
                    provider: provider.name().to_string(),
                    container,
                });
                break;
            }
        }
    }

    candidates.sort_by_key(|candidate| {
        let stream = pending_streams
            .iter()
            .find(|s| s.infohash() == candidate.infohash);
        let matches_target = target_season.is_some_and(|season| {
            stream.is_some_and(|s| s.parsed_data().seasons.contains(&season))
        });
        let single_season = stream.is_some_and(|s| s.parsed_data().seasons.len() == 1);
        (
            Reverse(matches_target),
            Reverse(single_season),
            Reverse(candidate.container.median_file_size()),
        )
    });

    candidates
}

/// Reorder `pending` (a list of infohashes in ranked order) so that the
/// first `candidates.len()`-sized window reflects the pre-validation sort,
/// leaving the tail untouched.
#[must_use]
pub fn apply_prevalidation_order(pending: Vec<String>, candidates: &[PrevalidatedCandidate]) -> Vec<String> {
    let window_len = pending.len().min(5);
    let (window, tail) = pending.split_at(window_len.min(pending.len()));
    let mut reordered: Vec<String> = candidates
        .iter()
        .map(|c| c.infohash.clone())
        .filter(|hash| window.contains(hash))
        .collect();
    for hash in window {
        if !reordered.contains(hash) {
            reordered.push(hash.clone());
        }
    }
    reordered.extend(tail.iter().cloned());
    reordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_prevalidation_order_moves_validated_candidates_to_the_front() {
        let pending = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let candidates = vec![PrevalidatedCandidate {
            infohash: "c".to_string(),
            provider: "realdebrid".into(),
            container: TorrentContainer {
                infohash: "c".into(),
                torrent_id: "t".into(),
                torrent_info: riven_media::TorrentInfo::default(),
                files: vec![],
                pre_validated: true,
            },
        }];
        let reordered = apply_prevalidation_order(pending, &candidates);
        assert_eq!(reordered, vec!["c", "a", "b"]);
    }

    #[test]
    fn apply_prevalidation_order_preserves_tail_beyond_the_window() {
        let pending: Vec<String> = (0..6).map(|n| n.to_string()).collect();
        let reordered = apply_prevalidation_order(pending.clone(), &[]);
        assert_eq!(reordered, pending);
    }
}

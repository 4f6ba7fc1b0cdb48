//! File-to-Item Matcher and MediaEntry Creation & Dedup.
//!
//! Binds a debrid provider's container files to concrete item leaves (Movie
//! or Episode) and builds the `MediaEntry` records the VFS host will later
//! register. A file is "matched" when it both parses as the right kind of
//! content and resolves to a leaf that isn't already materialized.

use std::collections::HashSet;

use riven_data::ItemRepository;
use riven_media::{ContainerFile, ItemKind, MediaEntry, MediaItem, MediaMetadata, TorrentContainer};
use riven_ranking::parse_release_title;
use uuid::Uuid;

use crate::error::{DownloadError, DownloadResult};

/// A file bound to the leaf item that should own it as a `MediaEntry`.
#[derive(Debug, Clone)]
pub struct MatchedEntry {
    /// Id of the leaf item (Movie or Episode) that owns `entry`.
    pub leaf_id: Uuid,
    /// The entry to attach.
    pub entry: MediaEntry,
}

/// Match every file in `container` against `item`, producing one
/// `MatchedEntry` per accepted file. `item` may be a Movie, Show, Season, or
/// Episode; episodic resolution walks up to the owning Show as needed.
///
/// # Errors
///
/// Returns [`DownloadError::Data`] if the parent chain needed to resolve an
/// episodic match is broken, or [`DownloadError::NotEpisodic`] if `item` is a
/// Movie parent chain that cannot be resolved.
pub fn match_container_files(
    repo: &ItemRepository,
    item: &MediaItem,
    container: &TorrentContainer,
    provider: &str,
    profile_name: &str,
) -> DownloadResult<Vec<MatchedEntry>> {
    match item.kind {
        ItemKind::Movie => Ok(match_movie_files(item.id, container, provider, profile_name)),
        ItemKind::Show | ItemKind::Season | ItemKind::Episode => {
            match_episodic_files(repo, item, container, provider, profile_name)
        }
    }
}

fn match_movie_files(
    movie_id: Uuid,
    container: &TorrentContainer,
    provider: &str,
    profile_name: &str,
) -> Vec<MatchedEntry> {
    container
        .files
        .iter()
        .filter(|file| {
            let parsed = parse_release_title(&file.filename);
            parsed.seasons.is_empty() && parsed.episodes.is_empty()
        })
        .map(|file| MatchedEntry {
            leaf_id: movie_id,
            entry: build_entry(file, container, provider, profile_name),
        })
        .collect()
}

fn match_episodic_files(
    repo: &ItemRepository,
    item: &MediaItem,
    container: &TorrentContainer,
    provider: &str,
    profile_name: &str,
) -> DownloadResult<Vec<MatchedEntry>> {
    let show_id = resolve_show_id(repo, item)?;
    let episode_cap = repo.episode_cap(show_id)?;
    let default_season = resolve_default_season(repo, item)?;

    let mut processed = HashSet::new();
    let mut matches = Vec::new();

    for file in &container.files {
        let parsed = parse_release_title(&file.filename);
        if parsed.seasons.contains(&0) || parsed.episodes.contains(&0) {
            continue;
        }
        if parsed.episodes.is_empty() {
            continue;
        }
        let season_number = parsed.seasons.first().copied().or(default_season);
        for &episode_number in &parsed.episodes {
            if episode_number > episode_cap {
                continue;
            }
            let Some(episode_id) = repo.get_absolute_episode(show_id, episode_number, season_number)? else {
                continue;
            };
            if !processed.insert(episode_id) {
                continue;
            }
            let episode = repo.get(episode_id)?;
            if episode.has_symlinked_entry() {
                continue;
            }
            matches.push(MatchedEntry {
                leaf_id: episode_id,
                entry: build_entry(file, container, provider, profile_name),
            });
        }
    }
    Ok(matches)
}

fn resolve_show_id(repo: &ItemRepository, item: &MediaItem) -> DownloadResult<Uuid> {
    match item.kind {
        ItemKind::Show => Ok(item.id),
        ItemKind::Season => item
            .parent_id
            .ok_or(DownloadError::NotEpisodic { id: item.id }),
        ItemKind::Episode => {
            let season_id = item
                .parent_id
                .ok_or(DownloadError::NotEpisodic { id: item.id })?;
            let season = repo.get(season_id)?;
            season
                .parent_id
                .ok_or(DownloadError::NotEpisodic { id: season_id })
        }
        ItemKind::Movie => Err(DownloadError::NotEpisodic { id: item.id }),
    }
}

/// The season number to assume for a file whose parsed title carries no
/// season annotation of its own (e.g. a bare `05.mkv` inside a season pack).
fn resolve_default_season(repo: &ItemRepository, item: &MediaItem) -> DownloadResult<Option<u32>> {
    match item.kind {
        ItemKind::Season => Ok(item.number),
        ItemKind::Episode => {
            let season_id = item
                .parent_id
                .ok_or(DownloadError::NotEpisodic { id: item.id })?;
            Ok(repo.get(season_id)?.number)
        }
        ItemKind::Show | ItemKind::Movie => Ok(None),
    }
}

fn build_entry(
    file: &ContainerFile,
    container: &TorrentContainer,
    provider: &str,
    profile_name: &str,
) -> MediaEntry {
    let parsed = parse_release_title(&file.filename);
    MediaEntry {
        id: Uuid::new_v4(),
        original_filename: file.filename.clone(),
        download_url: format!(
            "https://{provider}.debrid.invalid/dl/{}/{}",
            container.torrent_id, file.file_id
        ),
        provider: provider.to_string(),
        provider_download_id: container.torrent_id.clone(),
        file_size: file.size_bytes,
        infohash: container.infohash.to_ascii_lowercase(),
        media_metadata: MediaMetadata {
            parsed,
            profile_name: profile_name.to_string(),
        },
        library_profiles: vec![profile_name.to_string()],
        vfs_paths: vec![],
    }
}

/// Attach `entry` to `leaf`, updating in place on a `(infohash,
/// profile_name)` match and appending otherwise.
pub fn attach_entry(leaf: &mut MediaItem, entry: MediaEntry) {
    let key = entry.dedup_key();
    if let Some(existing) = leaf
        .filesystem_entries
        .iter_mut()
        .find(|candidate| candidate.dedup_key() == key)
    {
        *existing = entry;
    } else {
        leaf.filesystem_entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_media::{Aliases, ExternalIds, TorrentInfo};
    use std::collections::HashSet as StdHashSet;

    fn movie_item() -> MediaItem {
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
            blacklisted_streams: StdHashSet::new(),
            active_stream: None,
            filesystem_entries: vec![],
            aliases: Aliases::default(),
            scraped_at: None,
        }
    }

    fn container(files: Vec<ContainerFile>) -> TorrentContainer {
        TorrentContainer {
            infohash: "A".repeat(40),
            torrent_id: "t1".into(),
            torrent_info: TorrentInfo {
                size_bytes: files.iter().map(|f| f.size_bytes).sum(),
                file_count: files.len(),
            },
            files,
            pre_validated: false,
        }
    }

    #[test]
    fn movie_match_accepts_files_with_no_season_or_episode_tags() {
        let item = movie_item();
        let c = container(vec![ContainerFile {
            filename: "A.Movie.2021.mkv".into(),
            size_bytes: 1000,
            file_id: "1".into(),
        }]);
        let matches = match_container_files(&ItemRepository::new(), &item, &c, "realdebrid", "default").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].leaf_id, item.id);
        assert_eq!(matches[0].entry.infohash, "a".repeat(40));
    }

    #[test]
    fn movie_match_rejects_files_parsed_as_episodic() {
        let item = movie_item();
        let c = container(vec![ContainerFile {
            filename: "Show.S01E02.mkv".into(),
            size_bytes: 1000,
            file_id: "1".into(),
        }]);
        let matches = match_container_files(&ItemRepository::new(), &item, &c, "realdebrid", "default").unwrap();
        assert!(matches.is_empty());
    }

    fn show(repo: &ItemRepository) -> (Uuid, Uuid) {
        let show_id = Uuid::new_v4();
        let mut show = movie_item();
        show.id = show_id;
        show.kind = ItemKind::Show;
        repo.insert(show).unwrap();

        let season_id = Uuid::new_v4();
        let mut season = movie_item();
        season.id = season_id;
        season.kind = ItemKind::Season;
        season.parent_id = Some(show_id);
        season.number = Some(1);
        repo.insert(season).unwrap();

        for n in 1..=3 {
            let mut episode = movie_item();
            episode.id = Uuid::new_v4();
            episode.kind = ItemKind::Episode;
            episode.parent_id = Some(season_id);
            episode.number = Some(n);
            repo.insert(episode).unwrap();
        }
        (show_id, season_id)
    }

    #[test]
    fn episodic_match_resolves_episodes_and_rejects_specials() {
        let repo = ItemRepository::new();
        let (show_id, _season_id) = show(&repo);
        let item = repo.get(show_id).unwrap();

        let c = container(vec![
            ContainerFile {
                filename: "Show.S01E02.mkv".into(),
                size_bytes: 1000,
                file_id: "1".into(),
            },
            ContainerFile {
                filename: "Show.S00E01.mkv".into(),
                size_bytes: 1000,
                file_id: "2".into(),
            },
        ]);
        let matches = match_container_files(&repo, &item, &c, "realdebrid", "default").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn episodic_match_skips_already_symlinked_episodes() {
        let repo = ItemRepository::new();
        let (show_id, season_id) = show(&repo);
        let episodes = repo.children_of(season_id);
        let ep2 = episodes.iter().find(|e| e.number == Some(2)).unwrap().id;
        repo.update(ep2, |e| {
            e.filesystem_entries.push(MediaEntry {
                id: Uuid::new_v4(),
                original_filename: "old.mkv".into(),
                download_url: "https://x.invalid".into(),
                provider: "realdebrid".into(),
                provider_download_id: "old".into(),
                file_size: 1,
                infohash: "b".repeat(40),
                media_metadata: MediaMetadata::default(),
                library_profiles: vec!["default".into()],
                vfs_paths: vec!["default/x.mkv".into()],
            });
        })
        .unwrap();

        let item = repo.get(show_id).unwrap();
        let c = container(vec![ContainerFile {
            filename: "Show.S01E02.mkv".into(),
            size_bytes: 1000,
            file_id: "1".into(),
        }]);
        let matches = match_container_files(&repo, &item, &c, "realdebrid", "default").unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn episodic_match_rejects_episode_numbers_past_the_cap() {
        let repo = ItemRepository::new();
        let (show_id, _season_id) = show(&repo);
        let item = repo.get(show_id).unwrap();

        let c = container(vec![ContainerFile {
            filename: "Show.S01E99.mkv".into(),
            size_bytes: 1000,
            file_id: "1".into(),
        }]);
        let matches = match_container_files(&repo, &item, &c, "realdebrid", "default").unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn attach_entry_updates_existing_infohash_profile_pair_in_place() {
        let mut leaf = movie_item();
        let c = container(vec![ContainerFile {
            filename: "a.mkv".into(),
            size_bytes: 1,
            file_id: "1".into(),
        }]);
        let first = build_entry(&c.files[0], &c, "realdebrid", "default");
        attach_entry(&mut leaf, first.clone());
        let mut second = first;
        second.original_filename = "renamed.mkv".into();
        attach_entry(&mut leaf, second);
        assert_eq!(leaf.filesystem_entries.len(), 1);
        assert_eq!(leaf.filesystem_entries[0].original_filename, "renamed.mkv");
    }
}

//! `rd-library` fallback: when the harvester returns no releases but signals
//! `needs_rd_library_check`, fall back to a case-insensitive substring match
//! of the item title against the debrid provider's own download listing.

use riven_debrid::{DebridProvider, DownloadEntry};
use riven_media::HarvestedRelease;

use crate::error::HarvesterResult;

/// Query `provider.get_downloads()` and return every entry whose filename
/// contains `title` (case-insensitively) as a synthesized
/// [`HarvestedRelease`] with `source_label = "rd-library"`.
///
/// # Errors
///
/// Returns an error if the provider call itself fails.
pub async fn rd_library_fallback(
    provider: &dyn DebridProvider,
    title: &str,
) -> HarvesterResult<Vec<HarvestedRelease>> {
    let downloads = provider.get_downloads().await?;
    Ok(downloads
        .into_iter()
        .filter(|entry| matches_title(entry, title))
        .map(|entry| HarvestedRelease {
            raw_title: entry.filename,
            infohash: entry.hash.map(|h| h.to_ascii_lowercase()),
            magnet: None,
            size_bytes: Some(entry.bytes),
            source_label: Some("rd-library".to_string()),
            season: None,
        })
        .collect())
}

fn matches_title(entry: &DownloadEntry, title: &str) -> bool {
    entry.filename.to_ascii_lowercase().contains(&title.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riven_debrid::{DebridResult, UserInfo};
    use riven_media::{ItemKind, TorrentContainer};

    struct StubProvider(Vec<DownloadEntry>);

    #[async_trait]
    impl DebridProvider for StubProvider {
        fn name(&self) -> &str {
            "realdebrid"
        }
        fn initialized(&self) -> bool {
            true
        }
        async fn instant_availability(&self, _: &str, _: ItemKind) -> DebridResult<Option<TorrentContainer>> {
            Ok(None)
        }
        async fn add_torrent(&self, _: &str) -> DebridResult<String> {
            Ok(String::new())
        }
        async fn get_torrent_info(&self, _: &str) -> DebridResult<TorrentContainer> {
            unimplemented!()
        }
        async fn select_files(&self, _: &str, _: &[String]) -> DebridResult<()> {
            Ok(())
        }
        async fn delete_torrent(&self, _: &str) -> DebridResult<()> {
            Ok(())
        }
        async fn get_downloads(&self) -> DebridResult<Vec<DownloadEntry>> {
            Ok(self.0.clone())
        }
        async fn get_user_info(&self) -> DebridResult<UserInfo> {
            Ok(UserInfo::default())
        }
    }

    #[tokio::test]
    async fn matches_are_case_insensitive_substrings() {
        let provider = StubProvider(vec![
            DownloadEntry {
                filename: "The.Matrix.1999.1080p.mkv".into(),
                bytes: 100,
                hash: Some("A".repeat(40)),
            },
            DownloadEntry {
                filename: "Unrelated.Movie.mkv".into(),
                bytes: 50,
                hash: None,
            },
        ]);
        let releases = rd_library_fallback(&provider, "the matrix").await.unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].source_label.as_deref(), Some("rd-library"));
        assert_eq!(releases[0].infohash.as_deref(), Some("a".repeat(40).as_str()));
    }
}

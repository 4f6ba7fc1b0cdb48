//! The debrid provider contract, implemented by each of RealDebrid,
//! Debrid-Link, and AllDebrid.

use async_trait::async_trait;
use riven_media::{ItemKind, TorrentContainer};

use crate::error::DebridResult;

/// A single entry in a provider's download/library listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    /// Filename as reported by the provider.
    pub filename: String,
    /// Size in bytes.
    pub bytes: u64,
    /// Infohash of the source torrent, when the provider reports one.
    pub hash: Option<String>,
}

/// Account status reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInfo {
    /// Whether the account has an active premium subscription.
    pub premium: bool,
    /// Provider-specific account identifier.
    pub user_id: Option<String>,
}

/// Operations every debrid provider must expose. Every HTTP client session
/// backing an implementation is scoped to a single call; no session is held
/// across operations.
#[async_trait]
pub trait DebridProvider: Send + Sync {
    /// Stable provider name (`realdebrid`, `debrid-link`, `alldebrid`).
    fn name(&self) -> &str;

    /// Whether this provider instance has valid credentials and should be
    /// queried at all.
    fn initialized(&self) -> bool;

    /// Query whether the provider already caches `infohash`, returning its
    /// file layout if so.
    async fn instant_availability(
        &self,
        infohash: &str,
        item_type: ItemKind,
    ) -> DebridResult<Option<TorrentContainer>>;

    /// Admit an infohash into the provider, returning the assigned torrent
    /// id.
    async fn add_torrent(&self, infohash: &str) -> DebridResult<String>;

    /// Fetch the file layout and aggregate size for a torrent id.
    async fn get_torrent_info(&self, torrent_id: &str) -> DebridResult<TorrentContainer>;

    /// Commit to downloading the given file ids within a torrent.
    async fn select_files(&self, torrent_id: &str, file_ids: &[String]) -> DebridResult<()>;

    /// Remove a torrent (and its probe, if pre-validation-only) from the
    /// provider. Best-effort: callers treat failures here as non-fatal.
    async fn delete_torrent(&self, torrent_id: &str) -> DebridResult<()>;

    /// List the provider's current library/downloads, used as a fallback
    /// when the harvester signals `needs_rd_library_check`.
    async fn get_downloads(&self) -> DebridResult<Vec<DownloadEntry>>;

    /// Fetch account status.
    async fn get_user_info(&self) -> DebridResult<UserInfo>;
}

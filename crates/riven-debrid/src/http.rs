//! A generic REST-backed [`DebridProvider`].
//!
//! The concrete wire formats of RealDebrid, Debrid-Link, and AllDebrid
//! diverge in endpoint shape and JSON field names, but all three follow the
//! same broad contract: add a magnet/infohash, poll for a file listing, pick
//! files, and fetch status later. Rather than fabricate per-provider request
//! bodies this client is parameterized by an [`Endpoints`] template and a
//! [`ResponseMapper`] the caller supplies per provider; callers compose one
//! `HttpDebridProvider` per backend with the template for that backend.

use std::time::Duration;

use async_trait::async_trait;
use riven_media::{ItemKind, TorrentContainer};

use crate::error::{DebridError, DebridResult};
use crate::provider::{DebridProvider, DownloadEntry, UserInfo};

/// Per-provider endpoint template. Each `{id}` placeholder is substituted
/// with the relevant torrent id at call time.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Base URL, e.g. `https://api.real-debrid.com/rest/1.0`.
    pub base_url: String,
    /// Path appended to `base_url` to add a torrent by magnet/infohash.
    pub add_torrent_path: String,
    /// Path template (with `{id}`) to fetch torrent info.
    pub torrent_info_path: String,
    /// Path template (with `{id}`) to select files within a torrent.
    pub select_files_path: String,
    /// Path template (with `{id}`) to delete a torrent.
    pub delete_torrent_path: String,
    /// Path to list the account's current downloads/library.
    pub downloads_path: String,
    /// Path to fetch account/user info.
    pub user_info_path: String,
}

/// Translates a provider's raw JSON payloads into this crate's domain types.
/// Implemented once per backend (RealDebrid, Debrid-Link, AllDebrid) and
/// supplied to [`HttpDebridProvider::new`].
pub trait ResponseMapper: Send + Sync {
    /// Parse an add-torrent response into the provider-assigned torrent id.
    fn parse_added_torrent_id(&self, body: &serde_json::Value) -> Option<String>;
    /// Parse a torrent-info response into a container, or `None` if the
    /// provider reports the torrent as not yet cached/ready.
    fn parse_torrent_container(
        &self,
        torrent_id: &str,
        body: &serde_json::Value,
    ) -> Option<TorrentContainer>;
    /// Parse a downloads/library listing response.
    fn parse_downloads(&self, body: &serde_json::Value) -> Vec<DownloadEntry>;
    /// Parse a user-info response.
    fn parse_user_info(&self, body: &serde_json::Value) -> UserInfo;
}

/// A [`DebridProvider`] backed by a bearer-token-authenticated REST API.
pub struct HttpDebridProvider {
    name: String,
    api_key: Option<String>,
    endpoints: Endpoints,
    mapper: Box<dyn ResponseMapper>,
    client: reqwest::Client,
}

impl HttpDebridProvider {
    /// Construct a new provider. `api_key` of `None` means the provider is
    /// unconfigured; [`DebridProvider::initialized`] returns `false` and every
    /// other method short-circuits with [`DebridError::NotFound`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        api_key: Option<String>,
        endpoints: Endpoints,
        mapper: Box<dyn ResponseMapper>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            name: name.into(),
            api_key,
            endpoints,
            mapper,
            client,
        }
    }

    fn require_key(&self) -> DebridResult<&str> {
        self.api_key.as_deref().ok_or_else(|| DebridError::NotFound {
            provider: self.name.clone(),
            torrent_id: String::new(),
        })
    }

    fn map_transport_err(&self, err: reqwest::Error) -> DebridError {
        if err.is_timeout() || err.is_connect() {
            return DebridError::CircuitBreakerOpen {
                provider: self.name.clone(),
            };
        }
        if let Some(status) = err.status() {
            if status.is_server_error() || status.as_u16() == 429 {
                return DebridError::CircuitBreakerOpen {
                    provider: self.name.clone(),
                };
            }
        }
        DebridError::Transient {
            provider: self.name.clone(),
            message: err.to_string(),
        }
    }

    fn substitute(template: &str, id: &str) -> String {
        template.replace("{id}", id)
    }
}

#[async_trait]
impl DebridProvider for HttpDebridProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialized(&self) -> bool {
        self.api_key.is_some()
    }

    async fn instant_availability(
        &self,
        infohash: &str,
        _item_type: ItemKind,
    ) -> DebridResult<Option<TorrentContainer>> {
        let key = self.require_key()?;
        let torrent_id = self.add_torrent(infohash).await?;
        let url = format!(
            "{}{}",
            self.endpoints.base_url,
            Self::substitute(&self.endpoints.torrent_info_path, &torrent_id)
        );
        let body: serde_json::Value = self
            .client
            .get(url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| self.map_transport_err(e))?
            .json()
            .await
            .map_err(|e| self.map_transport_err(e))?;
        Ok(self.mapper.parse_torrent_container(&torrent_id, &body))
    }

    async fn add_torrent(&self, infohash: &str) -> DebridResult<String> {
        let key = self.require_key()?;
        let url = format!("{}{}", self.endpoints.base_url, self.endpoints.add_torrent_path);
        let magnet = format!("magnet:?xt=urn:btih:{infohash}");
        let body: serde_json::Value = self
            .client
            .post(url)
            .bearer_auth(key)
            .form(&[("magnet", magnet.as_str())])
            .send()
            .await
            .map_err(|e| self.map_transport_err(e))?
            .json()
            .await
            .map_err(|e| self.map_transport_err(e))?;
        self.mapper
            .parse_added_torrent_id(&body)
            .ok_or_else(|| DebridError::InvalidFile {
                provider: self.name.clone(),
                reason: "add-torrent response missing an id".into(),
            })
    }

    async fn get_torrent_info(&self, torrent_id: &str) -> DebridResult<TorrentContainer> {
        let key = self.require_key()?;
        let url = format!(
            "{}{}",
            self.endpoints.base_url,
            Self::substitute(&self.endpoints.torrent_info_path, torrent_id)
        );
        let body: serde_json::Value = self
            .client
            .get(url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| self.map_transport_err(e))?
            .json()
            .await
            .map_err(|e| self.map_transport_err(e))?;
        self.mapper
            .parse_torrent_container(torrent_id, &body)
            .ok_or_else(|| DebridError::NotFound {
                provider: self.name.clone(),
                torrent_id: torrent_id.to_string(),
            })
    }

    async fn select_files(&self, torrent_id: &str, file_ids: &[String]) -> DebridResult<()> {
        let key = self.require_key()?;
        let url = format!(
            "{}{}",
            self.endpoints.base_url,
            Self::substitute(&self.endpoints.select_files_path, torrent_id)
        );
        self.client
            .post(url)
            .bearer_auth(key)
            .form(&[("files", file_ids.join(","))])
            .send()
            .await
            .map_err(|e| self.map_transport_err(e))?
            .error_for_status()
            .map_err(|e| self.map_transport_err(e))?;
        Ok(())
    }

    async fn delete_torrent(&self, torrent_id: &str) -> DebridResult<()> {
        let key = self.require_key()?;
        let url = format!(
            "{}{}",
            self.endpoints.base_url,
            Self::substitute(&self.endpoints.delete_torrent_path, torrent_id)
        );
        let _ = self.client.delete(url).bearer_auth(key).send().await;
        Ok(())
    }

    async fn get_downloads(&self) -> DebridResult<Vec<DownloadEntry>> {
        let key = self.require_key()?;
        let url = format!("{}{}", self.endpoints.base_url, self.endpoints.downloads_path);
        let body: serde_json::Value = self
            .client
            .get(url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| self.map_transport_err(e))?
            .json()
            .await
            .map_err(|e| self.map_transport_err(e))?;
        Ok(self.mapper.parse_downloads(&body))
    }

    async fn get_user_info(&self) -> DebridResult<UserInfo> {
        let key = self.require_key()?;
        let url = format!("{}{}", self.endpoints.base_url, self.endpoints.user_info_path);
        let body: serde_json::Value = self
            .client
            .get(url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| self.map_transport_err(e))?
            .json()
            .await
            .map_err(|e| self.map_transport_err(e))?;
        Ok(self.mapper.parse_user_info(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullMapper;
    impl ResponseMapper for NullMapper {
        fn parse_added_torrent_id(&self, body: &serde_json::Value) -> Option<String> {
            body.get("id").and_then(|v| v.as_str()).map(str::to_string)
        }
        fn parse_torrent_container(
            &self,
            _torrent_id: &str,
            _body: &serde_json::Value,
        ) -> Option<TorrentContainer> {
            None
        }
        fn parse_downloads(&self, _body: &serde_json::Value) -> Vec<DownloadEntry> {
            vec![]
        }
        fn parse_user_info(&self, _body: &serde_json::Value) -> UserInfo {
            UserInfo::default()
        }
    }

    fn unconfigured_provider() -> HttpDebridProvider {
        HttpDebridProvider::new(
            "realdebrid",
            None,
            Endpoints {
                base_url: "https://example.invalid".into(),
                add_torrent_path: "/add".into(),
                torrent_info_path: "/info/{id}".into(),
                select_files_path: "/select/{id}".into(),
                delete_torrent_path: "/delete/{id}".into(),
                downloads_path: "/downloads".into(),
                user_info_path: "/user".into(),
            },
            Box::new(NullMapper),
        )
    }

    #[test]
    fn unconfigured_provider_is_not_initialized() {
        let provider = unconfigured_provider();
        assert!(!provider.initialized());
    }

    #[tokio::test]
    async fn unconfigured_provider_rejects_every_call() {
        let provider = unconfigured_provider();
        assert!(provider.add_torrent("deadbeef").await.is_err());
        assert!(provider.get_downloads().await.is_err());
    }

    #[test]
    fn substitute_replaces_the_id_placeholder() {
        assert_eq!(
            HttpDebridProvider::substitute("/info/{id}", "abc123"),
            "/info/abc123"
        );
    }
}

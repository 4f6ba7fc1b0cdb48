//! HTTP client for the W2P harvester contract.

use std::time::Duration;

use riven_config::HarvesterConfig;
use riven_media::HarvestedRelease;
use riven_ranking::extract_btih;
use tracing::{debug, warn};

use crate::error::{HarvesterError, HarvesterResult};
use crate::wire::{HarvestRequestBody, HarvestRequestItem, HarvestResponseBody};

pub use crate::wire::HarvestRequestItem as HarvestQuery;

/// Outcome of a single-item harvest call.
#[derive(Debug, Clone, Default)]
pub struct HarvestOutcome {
    /// Releases resolved for the item, with infohashes normalized.
    pub releases: Vec<HarvestedRelease>,
    /// Whether the harvester signaled that the rd-library fallback should be
    /// consulted (empty `releases` and `needs_rd_library_check=true`).
    pub needs_rd_library_check: bool,
}

/// Thin client over `POST <base>/riven/harvest-item`. Every call is scoped
/// to exactly one item, per the wire contract (batching historically caused
/// request timeouts upstream).
pub struct HarvesterClient {
    config: HarvesterConfig,
    client: reqwest::Client,
}

impl HarvesterClient {
    /// Build a client from a configuration snapshot. Building still succeeds
    /// when `config.enabled` is `false`; [`Self::harvest_item`] short-circuits
    /// with [`HarvesterError::Disabled`] in that case.
    #[must_use]
    pub fn new(config: HarvesterConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Whether the harvester path is enabled and has a usable base URL.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.enabled && !self.config.base_url.is_empty()
    }

    /// Call the harvester for a single item, scoped to an optional
    /// `(season, episode)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`HarvesterError::Disabled`] if not configured,
    /// [`HarvesterError::Transport`] on a network/HTTP failure, or
    /// [`HarvesterError::Decode`] if the response body is malformed.
    pub async fn harvest_item(&self, item: HarvestQuery) -> HarvesterResult<HarvestOutcome> {
        if !self.enabled() {
            return Err(HarvesterError::Disabled);
        }

        let url = format!("{}/riven/harvest-item", self.config.base_url.trim_end_matches('/'));
        let body = HarvestRequestBody { items: vec![item] };

        let mut request = self.client.post(url).json(&body);
        if let (Some(name), Some(value)) = (&self.config.auth_header_name, &self.config.auth_header_value) {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "harvester request failed");
            HarvesterError::Transport(err.to_string())
        })?;

        let response = response.error_for_status().map_err(|err| HarvesterError::Transport(err.to_string()))?;

        let decoded: HarvestResponseBody = response
            .json()
            .await
            .map_err(|err| HarvesterError::Decode(err.to_string()))?;

        let Some(result) = decoded.items.into_iter().next() else {
            debug!(status = %decoded.status, "harvester returned no item results");
            return Ok(HarvestOutcome::default());
        };

        let releases = result
            .releases
            .into_iter()
            .filter_map(|wire| {
                let raw_title = wire.title.or(wire.raw_title).unwrap_or_default();
                let infohash = wire
                    .infohash
                    .map(|h| h.to_ascii_lowercase())
                    .or_else(|| extract_btih(wire.magnet.as_deref().unwrap_or_default()));
                if infohash.is_none() && raw_title.is_empty() {
                    return None;
                }
                Some(HarvestedRelease {
                    raw_title,
                    infohash,
                    magnet: wire.magnet,
                    size_bytes: wire.size_bytes,
                    source_label: wire.source_label,
                    season: wire.season,
                })
            })
            .collect();

        Ok(HarvestOutcome {
            releases,
            needs_rd_library_check: result.needs_rd_library_check,
        })
    }
}

impl HarvestRequestItem {
    /// Construct a movie-scoped request item.
    #[must_use]
    pub fn movie(id: impl Into<String>, title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year,
            kind: "movie",
            season: None,
            episode: None,
        }
    }

    /// Construct a show-scoped request item, optionally narrowed to a
    /// season and/or episode (used by the episode validator's targeted
    /// re-harvest).
    #[must_use]
    pub fn show(
        id: impl Into<String>,
        title: impl Into<String>,
        year: Option<i32>,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year,
            kind: "show",
            season,
            episode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> HarvesterConfig {
        HarvesterConfig {
            enabled: false,
            base_url: String::new(),
            auth_header_name: None,
            auth_header_value: None,
            timeout_secs: 900,
        }
    }

    #[tokio::test]
    async fn disabled_client_short_circuits() {
        let client = HarvesterClient::new(disabled_config());
        let item = HarvestRequestItem::movie("tt0111161", "The Shawshank Redemption", Some(1994));
        let err = client.harvest_item(item).await.unwrap_err();
        assert!(matches!(err, HarvesterError::Disabled));
    }

    #[test]
    fn enabled_requires_both_flag_and_base_url() {
        let mut config = disabled_config();
        config.enabled = true;
        assert!(!HarvesterClient::new(config).enabled());
    }
}

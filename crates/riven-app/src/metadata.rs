//! TMDB client: the one concrete metadata-provider implementation this
//! workspace carries. It backs both the Indexer (external id resolution,
//! season/episode discovery) and the Episode Validator's
//! [`riven_postprocess::EpisodeCountProvider`] seam.

use async_trait::async_trait;
use riven_config::MetadataConfig;
use riven_media::{ExternalIds, ItemKind, MediaItem};
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// A season discovered while indexing a show.
#[derive(Debug, Clone)]
pub struct TmdbSeason {
    /// Season number as reported by TMDB (0 is specials).
    pub season_number: u32,
    /// Season display name.
    pub name: String,
}

/// An episode discovered while indexing a season.
#[derive(Debug, Clone)]
pub struct TmdbEpisode {
    /// Episode number within its season.
    pub episode_number: u32,
    /// Episode title.
    pub name: String,
    /// Air date, if TMDB has one on record.
    pub air_date: Option<String>,
}

/// Thin client over the TMDB v3 REST API.
pub struct TmdbClient {
    config: MetadataConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: u64,
}

#[derive(Deserialize)]
struct ExternalIdsResponse {
    imdb_id: Option<String>,
}

#[derive(Deserialize)]
struct TvDetailsResponse {
    #[serde(default)]
    seasons: Vec<SeasonSummary>,
}

#[derive(Deserialize)]
struct SeasonSummary {
    season_number: u32,
    name: String,
}

#[derive(Deserialize)]
struct SeasonDetailsResponse {
    #[serde(default)]
    episodes: Vec<EpisodeSummary>,
}

#[derive(Deserialize)]
struct EpisodeSummary {
    episode_number: u32,
    name: String,
    air_date: Option<String>,
}

impl TmdbClient {
    /// Construct a client from the metadata provider configuration. Building
    /// succeeds even with no API key; every lookup then fails fast with
    /// [`AppError::MissingEnv`].
    #[must_use]
    pub fn new(config: MetadataConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    fn require_key(&self) -> AppResult<&str> {
        self.config.tmdb_api_key.as_deref().ok_or(AppError::MissingEnv { name: "RIVEN_METADATA__TMDB_API_KEY" })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let key = self.require_key()?;
        let url = format!("{}{path}", self.config.base_url);
        let mut request = self.client.get(&url).query(&[("api_key", key)]);
        request = request.query(query);
        let response = request.send().await.map_err(|source| AppError::http("tmdb.request", url.clone(), source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus { operation: "tmdb.request", url, status: status.as_u16() });
        }
        response.json::<T>().await.map_err(|source| AppError::http("tmdb.decode", url, source))
    }

    /// Resolve a movie's canonical identifiers by title/year.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is unset, the request fails, or no
    /// result is found.
    pub async fn resolve_movie(&self, title: &str, year: Option<i32>) -> AppResult<ExternalIds> {
        let mut query = vec![("query", title.to_string())];
        if let Some(year) = year {
            query.push(("year", year.to_string()));
        }
        let search: SearchResponse = self.get_json("/search/movie", &query).await?;
        let Some(hit) = search.results.first() else {
            return Ok(ExternalIds::default());
        };
        let external: ExternalIdsResponse =
            self.get_json(&format!("/movie/{}/external_ids", hit.id), &[]).await?;
        Ok(ExternalIds { imdb_id: external.imdb_id, tmdb_id: Some(hit.id.to_string()), tvdb_id: None })
    }

    /// Resolve a show's canonical identifiers by title/year.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is unset, the request fails, or no
    /// result is found.
    pub async fn resolve_show(&self, title: &str, year: Option<i32>) -> AppResult<ExternalIds> {
        let mut query = vec![("query", title.to_string())];
        if let Some(year) = year {
            query.push(("first_air_date_year", year.to_string()));
        }
        let search: SearchResponse = self.get_json("/search/tv", &query).await?;
        let Some(hit) = search.results.first() else {
            return Ok(ExternalIds::default());
        };
        let external: ExternalIdsResponse = self.get_json(&format!("/tv/{}/external_ids", hit.id), &[]).await?;
        Ok(ExternalIds { imdb_id: external.imdb_id, tmdb_id: Some(hit.id.to_string()), tvdb_id: None })
    }

    /// List a show's seasons (including specials) per TMDB's records.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is unset or the request fails.
    pub async fn seasons(&self, show_tmdb_id: &str) -> AppResult<Vec<TmdbSeason>> {
        let details: TvDetailsResponse = self.get_json(&format!("/tv/{show_tmdb_id}"), &[]).await?;
        Ok(details
            .seasons
            .into_iter()
            .map(|s| TmdbSeason { season_number: s.season_number, name: s.name })
            .collect())
    }

    /// List a season's episodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is unset or the request fails.
    pub async fn episodes(&self, show_tmdb_id: &str, season_number: u32) -> AppResult<Vec<TmdbEpisode>> {
        let details: SeasonDetailsResponse =
            self.get_json(&format!("/tv/{show_tmdb_id}/season/{season_number}"), &[]).await?;
        Ok(details
            .episodes
            .into_iter()
            .map(|e| TmdbEpisode { episode_number: e.episode_number, name: e.name, air_date: e.air_date })
            .collect())
    }
}

/// Adapts [`TmdbClient`] to the Episode Validator's metadata seam.
pub struct TmdbEpisodeCountProvider {
    client: std::sync::Arc<TmdbClient>,
}

impl TmdbEpisodeCountProvider {
    /// Wrap a shared client for use as an [`riven_postprocess::EpisodeCountProvider`].
    #[must_use]
    pub fn new(client: std::sync::Arc<TmdbClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl riven_postprocess::EpisodeCountProvider for TmdbEpisodeCountProvider {
    async fn expected_episode_count(&self, show: &MediaItem, season: &MediaItem) -> Result<u32, String> {
        if show.kind != ItemKind::Show {
            return Err(format!("item {} is not a show", show.id));
        }
        let Some(tmdb_id) = show.external_ids.tmdb_id.as_deref() else {
            return Err(format!("show {} has no tmdb id", show.id));
        };
        let Some(season_number) = season.number else {
            return Err(format!("season {} has no season number", season.id));
        };
        let episodes = self.client.episodes(tmdb_id, season_number).await.map_err(|err| {
            warn!(show = %show.id, season = %season.id, error = %err, "tmdb episode lookup failed");
            err.to_string()
        })?;
        Ok(u32::try_from(episodes.len()).unwrap_or(u32::MAX))
    }
}

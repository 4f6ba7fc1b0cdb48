//! Request/response bodies for the harvester HTTP contract.

use serde::{Deserialize, Serialize};

/// One item in a harvest request. The client always sends exactly one of
/// these per request (batching historically caused timeouts upstream).
#[derive(Debug, Clone, Serialize)]
pub struct HarvestRequestItem {
    /// Canonical identifier: `imdb_id`, `tmdb_id`, `tvdb_id`, or (when no
    /// identifier is known and the harvester allows direct-navigation) the
    /// item's title.
    pub id: String,
    /// Item title.
    pub title: String,
    /// Air year, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// `"movie"` or `"show"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Season number, when the request is scoped to a season or episode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number, when the request is scoped to a single episode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct HarvestRequestBody {
    pub items: Vec<HarvestRequestItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HarvestResponseBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub processed_count: u32,
    #[serde(default)]
    pub items: Vec<HarvestedItemResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HarvestedItemResult {
    #[serde(default)]
    pub item: serde_json::Value,
    #[serde(default)]
    pub releases: Vec<ReleaseWire>,
    #[serde(default)]
    pub needs_rd_library_check: bool,
}

/// Wire shape of a single release. Either `infohash` or `magnet` is present;
/// `title`/`raw_title` are interchangeable aliases upstream.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseWire {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub raw_title: Option<String>,
    #[serde(default)]
    pub infohash: Option<String>,
    #[serde(default)]
    pub magnet: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub source_label: Option<String>,
    #[serde(default)]
    pub season: Option<u32>,
}

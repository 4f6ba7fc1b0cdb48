//! Concrete [`HttpDebridProvider`] instances for the three debrid backends
//! the pipeline supports, assembled from credentials in [`ProvidersConfig`].
//!
//! `riven-debrid` deliberately stops at a generic REST client parameterized
//! by an [`Endpoints`] template and a [`ResponseMapper`]; the per-backend
//! wire formats live here, one [`ResponseMapper`] impl per provider.

use riven_config::ProvidersConfig;
use riven_debrid::{DebridProvider, Endpoints, HttpDebridProvider, ResponseMapper};
use riven_media::{ContainerFile, TorrentContainer, TorrentInfo};
use serde_json::Value;
use std::sync::Arc;

/// Build the three `HttpDebridProvider` backends from configured API keys.
/// A backend with no configured key is still constructed (and reports
/// [`DebridProvider::initialized`] as `false`) so callers can treat the
/// provider list uniformly.
#[must_use]
pub fn build_providers(config: &ProvidersConfig) -> Vec<Arc<dyn DebridProvider>> {
    vec![
        Arc::new(HttpDebridProvider::new(
            "realdebrid",
            config.realdebrid_api_key.clone(),
            real_debrid_endpoints(),
            Box::new(RealDebridMapper),
        )),
        Arc::new(HttpDebridProvider::new(
            "alldebrid",
            config.alldebrid_api_key.clone(),
            all_debrid_endpoints(),
            Box::new(AllDebridMapper),
        )),
        Arc::new(HttpDebridProvider::new(
            "debrid-link",
            config.debrid_link_api_key.clone(),
            debrid_link_endpoints(),
            Box::new(DebridLinkMapper),
        )),
    ]
}

fn real_debrid_endpoints() -> Endpoints {
    Endpoints {
        base_url: "https://api.real-debrid.com/rest/1.0".to_string(),
        add_torrent_path: "/torrents/addMagnet".to_string(),
        torrent_info_path: "/torrents/info/{id}".to_string(),
        select_files_path: "/torrents/selectFiles/{id}".to_string(),
        delete_torrent_path: "/torrents/delete/{id}".to_string(),
        downloads_path: "/downloads".to_string(),
        user_info_path: "/user".to_string(),
    }
}

struct RealDebridMapper;

impl ResponseMapper for RealDebridMapper {
    fn parse_added_torrent_id(&self, body: &Value) -> Option<String> {
        body.get("id").and_then(Value::as_str).map(str::to_string)
    }

    fn parse_torrent_container(&self, torrent_id: &str, body: &Value) -> Option<TorrentContainer> {
        let status = body.get("status").and_then(Value::as_str).unwrap_or_default();
        if status != "downloaded" {
            return None;
        }
        let files: Vec<ContainerFile> = body
            .get("files")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|f| f.get("selected").and_then(Value::as_i64) == Some(1))
            .map(|f| ContainerFile {
                filename: f.get("path").and_then(Value::as_str).unwrap_or_default().to_string(),
                size_bytes: f.get("bytes").and_then(Value::as_u64).unwrap_or(0),
                file_id: f.get("id").and_then(Value::as_i64).map_or_else(String::new, |id| id.to_string()),
            })
            .collect();
        let infohash = body.get("hash").and_then(Value::as_str).unwrap_or_default().to_string();
        Some(TorrentContainer {
            infohash,
            torrent_id: torrent_id.to_string(),
            torrent_info: TorrentInfo {
                size_bytes: body.get("bytes").and_then(Value::as_u64).unwrap_or(0),
                file_count: files.len(),
            },
            files,
            pre_validated: false,
        })
    }

    fn parse_downloads(&self, body: &Value) -> Vec<riven_debrid::DownloadEntry> {
        body.as_array()
            .into_iter()
            .flatten()
            .map(|entry| riven_debrid::DownloadEntry {
                filename: entry.get("filename").and_then(Value::as_str).unwrap_or_default().to_string(),
                bytes: entry.get("filesize").and_then(Value::as_u64).unwrap_or(0),
                hash: entry.get("hash").and_then(Value::as_str).map(str::to_string),
            })
            .collect()
    }

    fn parse_user_info(&self, body: &Value) -> riven_debrid::UserInfo {
        riven_debrid::UserInfo {
            premium: body.get("type").and_then(Value::as_str) == Some("premium"),
            user_id: body.get("id").and_then(Value::as_str).map(str::to_string),
        }
    }
}

fn all_debrid_endpoints() -> Endpoints {
    Endpoints {
        base_url: "https://api.alldebrid.com/v4".to_string(),
        add_torrent_path: "/magnet/upload".to_string(),
        torrent_info_path: "/magnet/status?id={id}".to_string(),
        select_files_path: "/magnet/status?id={id}".to_string(),
        delete_torrent_path: "/magnet/delete?id={id}".to_string(),
        downloads_path: "/magnet/status".to_string(),
        user_info_path: "/user".to_string(),
    }
}

struct AllDebridMapper;

impl AllDebridMapper {
    fn magnets(body: &Value) -> Vec<Value> {
        let data = body.get("data");
        if let Some(magnet) = data.and_then(|d| d.get("magnets")) {
            if let Some(array) = magnet.as_array() {
                return array.clone();
            }
            return vec![magnet.clone()];
        }
        vec![]
    }
}

impl ResponseMapper for AllDebridMapper {
    fn parse_added_torrent_id(&self, body: &Value) -> Option<String> {
        Self::magnets(body).first().and_then(|m| m.get("id")).map(|id| id.to_string())
    }

    fn parse_torrent_container(&self, torrent_id: &str, body: &Value) -> Option<TorrentContainer> {
        let magnet = Self::magnets(body).into_iter().next()?;
        let ready = magnet.get("status").and_then(Value::as_str) == Some("Ready");
        if !ready {
            return None;
        }
        let files: Vec<ContainerFile> = magnet
            .get("links")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(index, link)| ContainerFile {
                filename: link.get("filename").and_then(Value::as_str).unwrap_or_default().to_string(),
                size_bytes: link.get("size").and_then(Value::as_u64).unwrap_or(0),
                file_id: index.to_string(),
            })
            .collect();
        let infohash = magnet.get("hash").and_then(Value::as_str).unwrap_or_default().to_string();
        Some(TorrentContainer {
            infohash,
            torrent_id: torrent_id.to_string(),
            torrent_info: TorrentInfo {
                size_bytes: magnet.get("size").and_then(Value::as_u64).unwrap_or(0),
                file_count: files.len(),
            },
            files,
            pre_validated: false,
        })
    }

    fn parse_downloads(&self, body: &Value) -> Vec<riven_debrid::DownloadEntry> {
        Self::magnets(body)
            .into_iter()
            .map(|magnet| riven_debrid::DownloadEntry {
                filename: magnet.get("filename").and_then(Value::as_str).unwrap_or_default().to_string(),
                bytes: magnet.get("size").and_then(Value::as_u64).unwrap_or(0),
                hash: magnet.get("hash").and_then(Value::as_str).map(str::to_string),
            })
            .collect()
    }

    fn parse_user_info(&self, body: &Value) -> riven_debrid::UserInfo {
        let user = body.get("data").and_then(|d| d.get("user"));
        riven_debrid::UserInfo {
            premium: user.and_then(|u| u.get("isPremium")).and_then(Value::as_bool).unwrap_or(false),
            user_id: user.and_then(|u| u.get("username")).and_then(Value::as_str).map(str::to_string),
        }
    }
}

fn debrid_link_endpoints() -> Endpoints {
    Endpoints {
        base_url: "https://debrid-link.com/api/v2".to_string(),
        add_torrent_path: "/seedbox/add".to_string(),
        torrent_info_path: "/seedbox/list?ids={id}".to_string(),
        select_files_path: "/seedbox/list?ids={id}".to_string(),
        delete_torrent_path: "/seedbox/{id}/remove".to_string(),
        downloads_path: "/seedbox/list".to_string(),
        user_info_path: "/account/infos".to_string(),
    }
}

struct DebridLinkMapper;

impl DebridLinkMapper {
    fn entries(body: &Value) -> Vec<Value> {
        body.get("value").and_then(Value::as_array).cloned().unwrap_or_default()
    }
}

impl ResponseMapper for DebridLinkMapper {
    fn parse_added_torrent_id(&self, body: &Value) -> Option<String> {
        body.get("value").and_then(|v| v.get("id")).and_then(Value::as_str).map(str::to_string)
    }

    fn parse_torrent_container(&self, torrent_id: &str, body: &Value) -> Option<TorrentContainer> {
        let entry = Self::entries(body).into_iter().next()?;
        let ready = entry.get("status").and_then(Value::as_i64) == Some(100);
        if !ready {
            return None;
        }
        let files: Vec<ContainerFile> = entry
            .get("files")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|f| ContainerFile {
                filename: f.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                size_bytes: f.get("size").and_then(Value::as_u64).unwrap_or(0),
                file_id: f.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
            })
            .collect();
        let infohash = entry.get("hashString").and_then(Value::as_str).unwrap_or_default().to_string();
        Some(TorrentContainer {
            infohash,
            torrent_id: torrent_id.to_string(),
            torrent_info: TorrentInfo {
                size_bytes: entry.get("totalSize").and_then(Value::as_u64).unwrap_or(0),
                file_count: files.len(),
            },
            files,
            pre_validated: false,
        })
    }

    fn parse_downloads(&self, body: &Value) -> Vec<riven_debrid::DownloadEntry> {
        Self::entries(body)
            .into_iter()
            .map(|entry| riven_debrid::DownloadEntry {
                filename: entry.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                bytes: entry.get("totalSize").and_then(Value::as_u64).unwrap_or(0),
                hash: entry.get("hashString").and_then(Value::as_str).map(str::to_string),
            })
            .collect()
    }

    fn parse_user_info(&self, body: &Value) -> riven_debrid::UserInfo {
        let value = body.get("value");
        riven_debrid::UserInfo {
            premium: value.and_then(|v| v.get("accountType")).and_then(Value::as_i64).unwrap_or(0) > 0,
            user_id: value.and_then(|v| v.get("pseudo")).and_then(Value::as_str).map(str::to_string),
        }
    }
}

//! HTTP(S) tracker scrape implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_bytes::ByteBuf;
use tracing::debug;

use super::{ScrapeStats, TrackerError, TrackerScraper};
use crate::record::parse_info_hash;
use crate::store::ConnectionCache;

/// Scrapes trackers through the conventional `/scrape` endpoint.
#[derive(Debug)]
pub struct HttpTrackerScraper {
    connections: ConnectionCache,
}

impl HttpTrackerScraper {
    pub fn new(timeout: Duration) -> Self {
        Self {
            connections: ConnectionCache::new(timeout),
        }
    }
}

/// Derive the scrape URL from an announce URL.
///
/// The last path segment must start with `announce`; it is replaced by
/// `scrape`, keeping any suffix and query string.
pub fn scrape_url(announce: &str) -> Result<Url, TrackerError> {
    let mut url = Url::parse(announce).map_err(|_| TrackerError::InvalidUrl(announce.to_string()))?;

    let path = url.path().to_string();
    let (prefix, last) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
    let Some(suffix) = last.strip_prefix("announce") else {
        return Err(TrackerError::ScrapeUnsupported(announce.to_string()));
    };
    url.set_path(&format!("{}/scrape{}", prefix, suffix));
    Ok(url)
}

fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Bencoded body of a scrape response. Keys of `files` are raw info hashes.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    files: Option<HashMap<ByteBuf, FileStats>>,
    #[serde(rename = "failure reason", default)]
    failure_reason: Option<ByteBuf>,
}

#[derive(Debug, Deserialize)]
struct FileStats {
    #[serde(default)]
    complete: i64,
    #[serde(default)]
    incomplete: i64,
    #[serde(default)]
    downloaded: i64,
}

/// Extract the stats for `info_hash` from a bencoded scrape response.
fn parse_scrape_response(body: &[u8], info_hash: &[u8; 20]) -> Result<ScrapeStats, TrackerError> {
    let response: ScrapeResponse = serde_bencode::from_bytes(body)
        .map_err(|e| TrackerError::MalformedResponse(e.to_string()))?;

    if let Some(reason) = response.failure_reason {
        return Err(TrackerError::Rejected(
            String::from_utf8_lossy(&reason).into_owned(),
        ));
    }

    let files = response
        .files
        .ok_or_else(|| TrackerError::MalformedResponse("missing files dictionary".to_string()))?;
    let file = files
        .iter()
        .find(|(key, _)| key.as_slice() == info_hash.as_slice())
        .map(|(_, file)| file)
        .ok_or(TrackerError::NotReported)?;

    Ok(ScrapeStats {
        complete: file.complete.max(0) as u64,
        incomplete: file.incomplete.max(0) as u64,
        downloaded: file.downloaded.max(0) as u64,
    })
}

#[async_trait]
impl TrackerScraper for HttpTrackerScraper {
    fn name(&self) -> &str {
        "http"
    }

    async fn scrape(&self, info_hash: &str, announce: &str) -> Result<ScrapeStats, TrackerError> {
        let hash = parse_info_hash(info_hash)
            .map_err(|e| TrackerError::InvalidInfoHash(e.to_string()))?;

        let mut url = scrape_url(announce)?;
        let encoded = urlencoding::encode_binary(&hash.0);
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&info_hash={}", existing, encoded),
            _ => format!("info_hash={}", encoded),
        };
        url.set_query(Some(&query));

        let endpoint = origin(&url);
        let client = self
            .connections
            .get(&endpoint)
            .await
            .map_err(|e| TrackerError::ConnectionFailed(e.to_string()))?;

        debug!(url = %url, "Scraping HTTP tracker");

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.connections.invalidate(&endpoint, &e.to_string()).await;
                return Err(if e.is_timeout() {
                    TrackerError::Timeout
                } else {
                    TrackerError::ConnectionFailed(e.to_string())
                });
            }
        };

        if !response.status().is_success() {
            return Err(TrackerError::Rejected(format!("HTTP {}", response.status())));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TrackerError::Timeout
            } else {
                TrackerError::ConnectionFailed(e.to_string())
            }
        })?;

        parse_scrape_response(&body, &hash.0)
    }
}

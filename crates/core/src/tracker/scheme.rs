//! Scheme-based dispatch between tracker implementations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::{HttpTrackerScraper, ScrapeStats, TrackerError, TrackerScraper, UdpTrackerScraper};

/// Routes each announce URL to the implementation for its scheme.
///
/// `http` and `https` go to [`HttpTrackerScraper`], `udp` to
/// [`UdpTrackerScraper`]. Anything else is rejected.
#[derive(Debug)]
pub struct SchemeTrackerScraper {
    http: HttpTrackerScraper,
    udp: UdpTrackerScraper,
}

impl SchemeTrackerScraper {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpTrackerScraper::new(timeout),
            udp: UdpTrackerScraper::new(timeout),
        }
    }

    fn select(&self, announce: &str) -> Result<&dyn TrackerScraper, TrackerError> {
        let url = Url::parse(announce).map_err(|_| TrackerError::InvalidUrl(announce.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(&self.http),
            "udp" => Ok(&self.udp),
            other => Err(TrackerError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[async_trait]
impl TrackerScraper for SchemeTrackerScraper {
    fn name(&self) -> &str {
        "scheme"
    }

    async fn scrape(&self, info_hash: &str, announce: &str) -> Result<ScrapeStats, TrackerError> {
        self.select(announce)?.scrape(info_hash, announce).await
    }
}

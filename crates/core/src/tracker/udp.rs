//! UDP tracker scrape implementation (BEP 15).

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::net::UdpSocket;
use tracing::debug;

use super::{ScrapeStats, TrackerError, TrackerScraper};
use crate::record::parse_info_hash;

const PROTOCOL_ID: u64 = 0x0417_2710_1980;
const ACTION_CONNECT: u32 = 0;
const ACTION_SCRAPE: u32 = 2;
const ACTION_ERROR: u32 = 3;

/// Extra sends of a request whose response did not arrive in time.
const RETRANSMITS: u32 = 2;

/// Scrapes `udp://` trackers with a connect + scrape exchange.
///
/// Each request is resent up to `RETRANSMITS` times, so one attempt can
/// take `timeout * (RETRANSMITS + 1)` before failing with `Timeout`.
#[derive(Debug, Clone)]
pub struct UdpTrackerScraper {
    timeout: Duration,
}

impl UdpTrackerScraper {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn exchange(
        &self,
        socket: &UdpSocket,
        request: &[u8],
        buf: &mut [u8],
    ) -> Result<usize, TrackerError> {
        for attempt in 0..=RETRANSMITS {
            if attempt > 0 {
                debug!(attempt, "No response from UDP tracker, retransmitting");
            }
            socket
                .send(request)
                .await
                .map_err(|e| TrackerError::ConnectionFailed(e.to_string()))?;
            match tokio::time::timeout(self.timeout, socket.recv(buf)).await {
                Ok(received) => {
                    return received.map_err(|e| TrackerError::ConnectionFailed(e.to_string()))
                }
                Err(_) => continue,
            }
        }
        Err(TrackerError::Timeout)
    }
}

fn transaction_id() -> u32 {
    rand::random()
}

async fn resolve(announce: &str) -> Result<SocketAddr, TrackerError> {
    let url = Url::parse(announce).map_err(|_| TrackerError::InvalidUrl(announce.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| TrackerError::InvalidUrl(announce.to_string()))?
        .trim_matches(|c| c == '[' || c == ']')
        .to_string();
    let port = url
        .port()
        .ok_or_else(|| TrackerError::InvalidUrl(announce.to_string()))?;

    let mut addrs = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| TrackerError::ConnectionFailed(e.to_string()))?;
    addrs
        .next()
        .ok_or_else(|| TrackerError::ConnectionFailed(format!("no address for {}", host)))
}

pub(crate) fn encode_connect(transaction_id: u32) -> [u8; 16] {
    let mut packet = [0u8; 16];
    packet[..8].copy_from_slice(&PROTOCOL_ID.to_be_bytes());
    packet[8..12].copy_from_slice(&ACTION_CONNECT.to_be_bytes());
    packet[12..16].copy_from_slice(&transaction_id.to_be_bytes());
    packet
}

pub(crate) fn encode_scrape(connection_id: u64, transaction_id: u32, info_hash: &[u8; 20]) -> [u8; 36] {
    let mut packet = [0u8; 36];
    packet[..8].copy_from_slice(&connection_id.to_be_bytes());
    packet[8..12].copy_from_slice(&ACTION_SCRAPE.to_be_bytes());
    packet[12..16].copy_from_slice(&transaction_id.to_be_bytes());
    packet[16..36].copy_from_slice(info_hash);
    packet
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Validate the header shared by every response and return the action.
fn check_header(buf: &[u8], transaction_id: u32, min_len: usize) -> Result<u32, TrackerError> {
    if buf.len() < 8 {
        return Err(TrackerError::MalformedResponse(format!(
            "{} byte response",
            buf.len()
        )));
    }
    if read_u32(buf, 4) != transaction_id {
        return Err(TrackerError::MalformedResponse(
            "transaction id mismatch".to_string(),
        ));
    }
    let action = read_u32(buf, 0);
    if action == ACTION_ERROR {
        return Err(TrackerError::Rejected(
            String::from_utf8_lossy(&buf[8..]).into_owned(),
        ));
    }
    if buf.len() < min_len {
        return Err(TrackerError::MalformedResponse(format!(
            "{} byte response",
            buf.len()
        )));
    }
    Ok(action)
}

pub(crate) fn parse_connect(buf: &[u8], transaction_id: u32) -> Result<u64, TrackerError> {
    let action = check_header(buf, transaction_id, 16)?;
    if action != ACTION_CONNECT {
        return Err(TrackerError::MalformedResponse(format!(
            "expected connect response, got action {}",
            action
        )));
    }
    let mut id = [0u8; 8];
    id.copy_from_slice(&buf[8..16]);
    Ok(u64::from_be_bytes(id))
}

pub(crate) fn parse_scrape(buf: &[u8], transaction_id: u32) -> Result<ScrapeStats, TrackerError> {
    let action = check_header(buf, transaction_id, 20)?;
    if action != ACTION_SCRAPE {
        return Err(TrackerError::MalformedResponse(format!(
            "expected scrape response, got action {}",
            action
        )));
    }
    Ok(ScrapeStats {
        complete: read_u32(buf, 8) as u64,
        downloaded: read_u32(buf, 12) as u64,
        incomplete: read_u32(buf, 16) as u64,
    })
}

#[async_trait]
impl TrackerScraper for UdpTrackerScraper {
    fn name(&self) -> &str {
        "udp"
    }

    async fn scrape(&self, info_hash: &str, announce: &str) -> Result<ScrapeStats, TrackerError> {
        let hash = parse_info_hash(info_hash)
            .map_err(|e| TrackerError::InvalidInfoHash(e.to_string()))?;
        let addr = resolve(announce).await?;

        let bind: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| TrackerError::ConnectionFailed(e.to_string()))?;
        socket
            .connect(addr)
            .await
            .map_err(|e| TrackerError::ConnectionFailed(e.to_string()))?;

        debug!(tracker = announce, addr = %addr, "Scraping UDP tracker");

        let mut buf = [0u8; 1024];

        let tid = transaction_id();
        let len = self.exchange(&socket, &encode_connect(tid), &mut buf).await?;
        let connection_id = parse_connect(&buf[..len], tid)?;

        let tid = transaction_id();
        let len = self
            .exchange(&socket, &encode_scrape(connection_id, tid, &hash.0), &mut buf)
            .await?;
        parse_scrape(&buf[..len], tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_connect() {
        let packet = encode_connect(0xDEADBEEF);
        assert_eq!(&packet[..8], &[0, 0, 0x04, 0x17, 0x27, 0x10, 0x19, 0x80]);
        assert_eq!(&packet[8..12], &[0, 0, 0, 0]);
        assert_eq!(&packet[12..16], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_encode_scrape() {
        let packet = encode_scrape(42, 7, &[9u8; 20]);
        assert_eq!(&packet[..8], &42u64.to_be_bytes());
        assert_eq!(read_u32(&packet, 8), ACTION_SCRAPE);
        assert_eq!(read_u32(&packet, 12), 7);
        assert_eq!(&packet[16..], &[9u8; 20]);
    }

    #[test]
    fn test_parse_connect() {
        let mut response = Vec::new();
        response.extend_from_slice(&ACTION_CONNECT.to_be_bytes());
        response.extend_from_slice(&5u32.to_be_bytes());
        response.extend_from_slice(&0x1122334455667788u64.to_be_bytes());

        assert_eq!(parse_connect(&response, 5).unwrap(), 0x1122334455667788);
        assert!(matches!(
            parse_connect(&response, 6),
            Err(TrackerError::MalformedResponse(_))
        ));
        assert!(parse_connect(&response[..12], 5).is_err());
    }

    #[test]
    fn test_parse_scrape() {
        let mut response = Vec::new();
        response.extend_from_slice(&ACTION_SCRAPE.to_be_bytes());
        response.extend_from_slice(&9u32.to_be_bytes());
        for n in [12u32, 340, 3] {
            response.extend_from_slice(&n.to_be_bytes());
        }

        let stats = parse_scrape(&response, 9).unwrap();
        assert_eq!(
            stats,
            ScrapeStats {
                complete: 12,
                downloaded: 340,
                incomplete: 3
            }
        );
    }

    #[test]
    fn test_parse_error_action() {
        let mut response = Vec::new();
        response.extend_from_slice(&ACTION_ERROR.to_be_bytes());
        response.extend_from_slice(&1u32.to_be_bytes());
        response.extend_from_slice(b"unknown torrent");

        assert!(matches!(
            parse_scrape(&response, 1),
            Err(TrackerError::Rejected(msg)) if msg == "unknown torrent"
        ));
    }

    #[tokio::test]
    async fn test_scrape_against_local_tracker() {
        let tracker = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = tracker.local_addr().unwrap().port();

        tokio::spawn(async move {
            let mut buf = [0u8; 128];

            let (len, peer) = tracker.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 16);
            let mut reply = Vec::new();
            reply.extend_from_slice(&ACTION_CONNECT.to_be_bytes());
            reply.extend_from_slice(&buf[12..16]);
            reply.extend_from_slice(&99u64.to_be_bytes());
            tracker.send_to(&reply, peer).await.unwrap();

            let (len, peer) = tracker.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 36);
            assert_eq!(&buf[..8], &99u64.to_be_bytes());
            let mut reply = Vec::new();
            reply.extend_from_slice(&ACTION_SCRAPE.to_be_bytes());
            reply.extend_from_slice(&buf[12..16]);
            for n in [4u32, 20, 2] {
                reply.extend_from_slice(&n.to_be_bytes());
            }
            tracker.send_to(&reply, peer).await.unwrap();
        });

        let scraper = UdpTrackerScraper::new(Duration::from_secs(2));
        let stats = scraper
            .scrape(
                "0123456789abcdef0123456789abcdef01234567",
                &format!("udp://127.0.0.1:{}/announce", port),
            )
            .await
            .unwrap();

        assert_eq!(stats.complete, 4);
        assert_eq!(stats.downloaded, 20);
        assert_eq!(stats.incomplete, 2);
    }

    #[tokio::test]
    async fn test_lost_connect_request_is_retransmitted() {
        let tracker = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = tracker.local_addr().unwrap().port();

        tokio::spawn(async move {
            let mut buf = [0u8; 128];

            // Drop the first connect request.
            tracker.recv_from(&mut buf).await.unwrap();

            let (len, peer) = tracker.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 16);
            let mut reply = Vec::new();
            reply.extend_from_slice(&ACTION_CONNECT.to_be_bytes());
            reply.extend_from_slice(&buf[12..16]);
            reply.extend_from_slice(&7u64.to_be_bytes());
            tracker.send_to(&reply, peer).await.unwrap();

            let (_, peer) = tracker.recv_from(&mut buf).await.unwrap();
            let mut reply = Vec::new();
            reply.extend_from_slice(&ACTION_SCRAPE.to_be_bytes());
            reply.extend_from_slice(&buf[12..16]);
            for n in [1u32, 2, 3] {
                reply.extend_from_slice(&n.to_be_bytes());
            }
            tracker.send_to(&reply, peer).await.unwrap();
        });

        let scraper = UdpTrackerScraper::new(Duration::from_millis(200));
        let stats = scraper
            .scrape(
                "0123456789abcdef0123456789abcdef01234567",
                &format!("udp://127.0.0.1:{}/announce", port),
            )
            .await
            .unwrap();

        assert_eq!(stats.complete, 1);
        assert_eq!(stats.downloaded, 2);
        assert_eq!(stats.incomplete, 3);
    }

    #[tokio::test]
    async fn test_resolve_strips_ipv6_brackets() {
        let addr = resolve("udp://[::1]:6969/announce").await.unwrap();
        assert_eq!(addr, "[::1]:6969".parse::<SocketAddr>().unwrap());

        assert!(matches!(
            resolve("udp://tracker.example/announce").await,
            Err(TrackerError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_scrape_timeout() {
        // Bound but silent.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();

        let scraper = UdpTrackerScraper::new(Duration::from_millis(100));
        let result = scraper
            .scrape(
                "0123456789abcdef0123456789abcdef01234567",
                &format!("udp://127.0.0.1:{}", port),
            )
            .await;
        assert!(matches!(result, Err(TrackerError::Timeout)));
        drop(silent);
    }
}

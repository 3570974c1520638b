//! HTTP record store client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use super::{parse_body, ConnectionCache, RecordStore, StoreError};
use crate::metrics;
use crate::record::Record;

/// Record store reached over HTTP(S).
///
/// Requests go to `{endpoint}/{path}`. Bodies are JSON both ways.
#[derive(Debug)]
pub struct HttpRecordStore {
    endpoint: String,
    connections: ConnectionCache,
}

impl HttpRecordStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            connections: ConnectionCache::new(timeout),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// Issue a request and return the raw response body.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<String, StoreError> {
        let client = self
            .connections
            .get(&self.endpoint)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let url = self.url(path);
        debug!(method = %method, url = %url, "Store request");

        let mut request = client.request(method, &url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let result = match request.send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(text) if status.is_success() => Ok(text),
                    Ok(text) => Err(StoreError::Http {
                        status: status.as_u16(),
                        body: text.chars().take(200).collect(),
                    }),
                    Err(e) => Err(map_reqwest_error(e)),
                }
            }
            Err(e) => Err(map_reqwest_error(e)),
        };

        if let Err(ref e) = result {
            if e.invalidates_connection() {
                self.connections
                    .invalidate(&self.endpoint, &e.to_string())
                    .await;
            }
        }

        result
    }

    async fn post_json(&self, path: &str, body: &impl serde::Serialize) -> Result<Value, StoreError> {
        let bytes = serde_json::to_vec(body).map_err(|e| StoreError::Serialize(e.to_string()))?;
        let text = self.request(Method::POST, path, Some(bytes)).await?;
        parse_body(&text).inspect_err(|_| {
            debug!(body = %text.chars().take(200).collect::<String>(), "Unexpected store acknowledgement");
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        // Connect, request and body errors all leave the connection unusable.
        StoreError::ConnectionFailed(e.to_string())
    }
}

fn observe(operation: &str, started: Instant, result: &Result<impl Sized, StoreError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::STORE_REQUESTS
        .with_label_values(&[operation, status])
        .inc();
    metrics::STORE_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_all(&self, path: &str) -> Result<Vec<Record>, StoreError> {
        let started = Instant::now();
        let result = match self.request(Method::GET, path, None).await {
            Ok(text) => parse_body::<Vec<Record>>(&text),
            Err(e) => Err(e),
        };
        observe("fetch_all", started, &result);
        result
    }

    async fn put(&self, path: &str, record: &Record) -> Result<Value, StoreError> {
        let started = Instant::now();
        let result = self.post_json(path, record).await;
        observe("put", started, &result);
        result
    }

    async fn open(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let started = Instant::now();
        let result = self.post_json(path, body).await;
        if let Err(ref e) = result {
            warn!(path = path, error = %e, "Open request failed");
        }
        observe("open", started, &result);
        result
    }
}

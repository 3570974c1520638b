//! Types for record store operations.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::record::Record;

/// Errors that can occur talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to serialize request body: {0}")]
    Serialize(String),
}

impl StoreError {
    /// Whether the cached connection should be dropped after this error.
    pub fn invalidates_connection(&self) -> bool {
        matches!(self, StoreError::ConnectionFailed(_) | StoreError::Timeout)
    }
}

/// Request/response access to the shared record collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend name (for logging).
    fn name(&self) -> &str;

    /// Read every record at `path`. Empty or malformed bodies are errors.
    async fn fetch_all(&self, path: &str) -> Result<Vec<Record>, StoreError>;

    /// Write one record, returning the store's acknowledgement.
    async fn put(&self, path: &str, record: &Record) -> Result<Value, StoreError>;

    /// Post an arbitrary JSON body, returning the acknowledgement.
    async fn open(&self, path: &str, body: &Value) -> Result<Value, StoreError>;
}

/// Request paths for one collection of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    collection: String,
}

impl CollectionPaths {
    /// `address` may be raw (`/orbitdb/<cid>/<name>`) or already url-encoded.
    pub fn new(address: &str) -> Self {
        let address = if address.contains('/') {
            urlencoding::encode(address).into_owned()
        } else {
            address.to_string()
        };
        Self {
            collection: format!("db/{}", address),
        }
    }

    /// Path that opens the collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Path returning every record.
    pub fn all(&self) -> String {
        format!("{}/all", self.collection)
    }

    /// Path accepting one record write.
    pub fn put(&self) -> String {
        format!("{}/put", self.collection)
    }
}

/// Parse a response body, treating an empty body as an error.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, StoreError> {
    if body.trim().is_empty() {
        return Err(StoreError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| StoreError::MalformedResponse(e.to_string()))
}

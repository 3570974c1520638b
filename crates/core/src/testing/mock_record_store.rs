//! Mock record store for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::record::Record;
use crate::store::{RecordStore, StoreError};

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Operation name ("fetch_all", "put", "open").
    pub operation: &'static str,
    /// Request path.
    pub path: String,
}

/// Mock implementation of the RecordStore trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable record set from `fetch_all`
/// - Upsert written records into that set, like the real store
/// - Simulate fetch and write failures, and slow fetches
///
/// # Example
///
/// ```rust,ignore
/// use swarmscrape_core::testing::{MockRecordStore, fixtures};
///
/// let store = MockRecordStore::new();
/// store.set_records(vec![fixtures::record(1, &[])]).await;
/// store.fail_puts(1).await;
///
/// // ...run the orchestrator...
///
/// assert_eq!(store.written().await.len(), 1);
/// ```
pub struct MockRecordStore {
    /// Records returned by `fetch_all`.
    records: Arc<RwLock<Vec<Record>>>,
    /// Every record successfully written, in order.
    written: Arc<RwLock<Vec<Record>>>,
    /// Requests made, in order.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// If set, the next fetch fails with this error.
    next_fetch_error: Arc<RwLock<Option<StoreError>>>,
    /// Number of upcoming puts that fail.
    put_failures: Arc<RwLock<usize>>,
    /// Delay applied to every fetch.
    fetch_delay: Arc<RwLock<Duration>>,
    /// If set, the next fetch panics.
    panic_next_fetch: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MockRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRecordStore")
            .field("records", &"<records>")
            .field("written", &"<written>")
            .finish()
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecordStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            written: Arc::new(RwLock::new(Vec::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_fetch_error: Arc::new(RwLock::new(None)),
            put_failures: Arc::new(RwLock::new(0)),
            fetch_delay: Arc::new(RwLock::new(Duration::ZERO)),
            panic_next_fetch: Arc::new(RwLock::new(false)),
        }
    }

    /// Replace the stored record set.
    pub async fn set_records(&self, records: Vec<Record>) {
        *self.records.write().await = records;
    }

    /// Current stored record set, including writes.
    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }

    /// Records written via `put`, in write order.
    pub async fn written(&self) -> Vec<Record> {
        self.written.read().await.clone()
    }

    /// Requests made against the store.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Make the next `fetch_all` fail.
    pub async fn fail_next_fetch(&self, error: StoreError) {
        *self.next_fetch_error.write().await = Some(error);
    }

    /// Make the next `fetch_all` panic, as a bug inside a run would.
    pub async fn panic_next_fetch(&self) {
        *self.panic_next_fetch.write().await = true;
    }

    /// Make the next `count` puts fail with a malformed acknowledgement.
    pub async fn fail_puts(&self, count: usize) {
        *self.put_failures.write().await = count;
    }

    /// Delay every fetch, to hold a run open.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.write().await = delay;
    }

    async fn record_request(&self, operation: &'static str, path: &str) {
        self.requests.write().await.push(RecordedRequest {
            operation,
            path: path.to_string(),
        });
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_all(&self, path: &str) -> Result<Vec<Record>, StoreError> {
        self.record_request("fetch_all", path).await;

        let delay = *self.fetch_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if std::mem::take(&mut *self.panic_next_fetch.write().await) {
            panic!("mock store: fetch panicked");
        }
        if let Some(error) = self.next_fetch_error.write().await.take() {
            return Err(error);
        }
        Ok(self.records.read().await.clone())
    }

    async fn put(&self, path: &str, record: &Record) -> Result<Value, StoreError> {
        self.record_request("put", path).await;

        {
            let mut failures = self.put_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(StoreError::MalformedResponse(
                    "expected value at line 1 column 1".to_string(),
                ));
            }
        }

        {
            let mut records = self.records.write().await;
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
        }
        self.written.write().await.push(record.clone());

        Ok(json!(record.id))
    }

    async fn open(&self, path: &str, _body: &Value) -> Result<Value, StoreError> {
        self.record_request("open", path).await;
        Ok(json!({ "ok": true }))
    }
}

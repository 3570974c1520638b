//! Record store client.
//!
//! This module provides a `RecordStore` trait for the remote JSON document
//! store that holds every record, and an HTTP implementation that keeps one
//! reusable connection per endpoint.

mod connection;
mod http;
mod types;

pub use connection::ConnectionCache;
pub use http::HttpRecordStore;
pub use types::*;

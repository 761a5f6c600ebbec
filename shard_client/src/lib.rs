#![warn(clippy::unwrap_used)]

//! Client-side interface to a partitioned, append-only log stream.
//!
//! The consumer core only ever talks to the stream service through the
//! [`StreamClient`] capability defined here, so a deterministic fake can
//! stand in for the network during tests.

pub mod error;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::*;
pub use types::*;

use async_trait::async_trait;
use shard_common::RetryableError;

/// Capability to position a cursor within a shard and retrieve records
/// from it.
///
/// Cursors are opaque, time-limited tokens. The service expires them a few
/// minutes after issue and offers no atomic "resume from here" primitive;
/// everything above this trait exists to cope with that contract.
#[async_trait]
pub trait StreamClient {
    type Error: RetryableError + Send + Sync + 'static;

    /// Obtain a cursor for a shard at the requested position.
    ///
    /// The returned cursor's position relative to the caller's last
    /// processed record is approximate; callers must not assume it lands
    /// exactly where they asked.
    async fn request_cursor(&self, request: CursorRequest) -> Result<String, Self::Error>;

    /// Retrieve at most `limit` records from `cursor`.
    ///
    /// A zero-record batch is normal and means the cursor is caught up;
    /// the batch always carries the service-provided next cursor.
    async fn get_records(&self, cursor: &str, limit: u32) -> Result<RecordBatch, Self::Error>;
}

#[async_trait]
impl<T> StreamClient for Box<T>
where
    T: StreamClient + Sync + ?Sized,
{
    type Error = <T as StreamClient>::Error;

    async fn request_cursor(&self, request: CursorRequest) -> Result<String, Self::Error> {
        (**self).request_cursor(request).await
    }

    async fn get_records(&self, cursor: &str, limit: u32) -> Result<RecordBatch, Self::Error> {
        (**self).get_records(cursor, limit).await
    }
}

#[cfg(test)]
#[ctor::ctor]
fn _setup() {
    shard_common::logger();
}

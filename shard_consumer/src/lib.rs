#![warn(clippy::unwrap_used)]

//! Consumer-side cursor management for one shard of a partitioned,
//! append-only log stream.
//!
//! The service's cursors expire after a bounded time and a freshly
//! requested cursor may land before, at, or after the caller's last-known
//! position. [`ShardCursorManager`] owns one shard's cursor, decides when
//! to refresh it, and reconciles every retrieval outcome into the cursor
//! trusted for the next call, so that neither a stale cursor nor an
//! over-eager jump loses or re-delivers records the caller has not asked
//! for.
//!
//! One manager per shard, driven by a single logical task in a poll loop.
//! Retry and backoff policy belong to that loop; every error the manager
//! surfaces carries its [`RetryableError`](shard_common::RetryableError)
//! classification and the phase that failed.

pub mod error;
pub mod manager;

pub use error::*;
pub use manager::*;

#[cfg(test)]
#[ctor::ctor]
fn _setup() {
    shard_common::logger();
}

use shard_common::time::Duration;
use shard_common::{retryable, RetryableError};
use thiserror::Error;

/// Errors surfaced by [`fetch_records`](crate::ShardCursorManager::fetch_records).
///
/// The failing phase is preserved because cursor-request and
/// record-retrieval failures call for different caller-side handling; the
/// source error propagates unchanged.
#[derive(Debug, Error)]
pub enum ConsumerError<E>
where
    E: std::error::Error + 'static,
{
    #[error("cursor request failed: {0}")]
    CursorRequest(#[source] E),
    #[error("record retrieval failed: {0}")]
    GetRecords(#[source] E),
    /// No cursor is held and the refresh produced none. Distinct from an
    /// empty batch: an empty batch is normal, this is a configuration
    /// problem.
    #[error("no cursor available for shard {shard_id}")]
    MissingCursor { shard_id: String },
}

impl<E> RetryableError for ConsumerError<E>
where
    E: RetryableError + 'static,
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::CursorRequest(e) | Self::GetRecords(e) => retryable!(e),
            Self::MissingCursor { .. } => false,
        }
    }
}

/// Rejected [`ShardCursorManagerBuilder`](crate::ShardCursorManagerBuilder)
/// configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("required field {0} was not set")]
    MissingField(&'static str),
    #[error("cursor refresh interval {interval:?} must be below the service cursor TTL")]
    RefreshIntervalTooLong { interval: Duration },
}

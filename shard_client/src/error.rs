use shard_common::RetryableError;
use thiserror::Error;

/// Errors reported by the stream service.
///
/// The cursor manager never recovers from these locally; they surface to
/// the poll-loop owner with their retryability classification intact.
#[derive(Debug, Error)]
pub enum StreamClientError {
    /// Stream or shard does not exist (deleted, or closed by a merge or
    /// split). Following shard lineage is the caller's problem.
    #[error("stream resource not found: {0}")]
    ResourceNotFound(String),
    /// The requested starting sequence number is invalid for this shard.
    #[error("invalid starting position: {0}")]
    InvalidPosition(String),
    #[error("request throttled: {0}")]
    Throttled(String),
    /// The cursor outlived the service TTL. The next fetch re-requests one.
    #[error("cursor expired")]
    ExpiredCursor,
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RetryableError for StreamClientError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttled(_) | Self::ExpiredCursor | Self::Transport(_)
        )
    }
}

/// Failure to interpret a decimal string as a sequence number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceNumberError {
    #[error("sequence number {0:?} is not a decimal digit string")]
    InvalidDigits(String),
}

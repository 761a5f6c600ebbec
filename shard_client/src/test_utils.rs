#![allow(clippy::unwrap_used)]

//! Deterministic stand-ins for the stream service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::mock;

use crate::{
    CursorRequest, Record, RecordBatch, SequenceNumber, StreamClient, StreamClientError,
};

/// Build records with the given sequence numbers, all on one partition key.
pub fn build_records(sequences: impl IntoIterator<Item = u64>, partition_key: &str) -> Vec<Record> {
    sequences
        .into_iter()
        .map(|seq| Record {
            data: seq.to_be_bytes().to_vec(),
            sequence_number: SequenceNumber::from(seq),
            partition_key: partition_key.to_string(),
        })
        .collect()
}

mock! {
    pub StreamClient {}

    #[async_trait]
    impl StreamClient for StreamClient {
        type Error = StreamClientError;

        async fn request_cursor(&self, request: CursorRequest) -> Result<String, StreamClientError>;
        async fn get_records(&self, cursor: &str, limit: u32) -> Result<RecordBatch, StreamClientError>;
    }
}

#[derive(Default)]
struct FixtureInner {
    cursors: VecDeque<String>,
    batches: HashMap<String, RecordBatch>,
    cursor_request_failures: VecDeque<StreamClientError>,
    get_records_failures: VecDeque<StreamClientError>,
    cursor_requests: Vec<CursorRequest>,
    record_requests: Vec<(String, u32)>,
}

/// A scripted [`StreamClient`] over shared state.
///
/// Tests stage the cursor strings handed out by `request_cursor` and the
/// batch served for each cursor, then assert against the call journals.
/// Retrieval from an unstaged cursor behaves like a shard at its tip: an
/// empty batch whose next cursor is the cursor itself.
///
/// Clones share state, so a test can keep a handle while the manager under
/// test owns its own copy.
#[derive(Clone, Default)]
pub struct FixtureStreamClient {
    inner: Arc<Mutex<FixtureInner>>,
}

impl FixtureStreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the cursor string returned by the next `request_cursor` call.
    pub fn push_cursor(&self, cursor: impl Into<String>) {
        self.inner.lock().unwrap().cursors.push_back(cursor.into());
    }

    /// Stage the batch served when `cursor` is retrieved from. Restaging
    /// the same cursor replaces the previous batch.
    pub fn stage_batch(
        &self,
        cursor: impl Into<String>,
        records: Vec<Record>,
        next_cursor: impl Into<String>,
    ) {
        self.inner.lock().unwrap().batches.insert(
            cursor.into(),
            RecordBatch {
                records,
                next_cursor: next_cursor.into(),
            },
        );
    }

    pub fn fail_next_cursor_request(&self, error: StreamClientError) {
        self.inner
            .lock()
            .unwrap()
            .cursor_request_failures
            .push_back(error);
    }

    pub fn fail_next_get_records(&self, error: StreamClientError) {
        self.inner
            .lock()
            .unwrap()
            .get_records_failures
            .push_back(error);
    }

    /// Journal of every positioning request issued so far.
    pub fn cursor_requests(&self) -> Vec<CursorRequest> {
        self.inner.lock().unwrap().cursor_requests.clone()
    }

    /// Journal of every retrieval issued so far, as `(cursor, limit)`.
    pub fn record_requests(&self) -> Vec<(String, u32)> {
        self.inner.lock().unwrap().record_requests.clone()
    }
}

#[async_trait]
impl StreamClient for FixtureStreamClient {
    type Error = StreamClientError;

    async fn request_cursor(&self, request: CursorRequest) -> Result<String, StreamClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.cursor_requests.push(request);
        if let Some(error) = inner.cursor_request_failures.pop_front() {
            return Err(error);
        }
        inner
            .cursors
            .pop_front()
            .ok_or_else(|| StreamClientError::Transport("fixture has no staged cursor".into()))
    }

    async fn get_records(&self, cursor: &str, limit: u32) -> Result<RecordBatch, StreamClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_requests.push((cursor.to_string(), limit));
        if let Some(error) = inner.get_records_failures.pop_front() {
            return Err(error);
        }
        Ok(inner.batches.get(cursor).cloned().unwrap_or_else(|| {
            tracing::debug!(%cursor, "no staged batch, serving shard tip");
            RecordBatch {
                records: vec![],
                next_cursor: cursor.to_string(),
            }
        }))
    }
}

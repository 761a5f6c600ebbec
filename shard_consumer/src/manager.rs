//! Cursor lifecycle for a single shard.

use shard_client::{CursorPosition, CursorRequest, Record, SequenceNumber, StreamClient};
use shard_common::time::{Clock, Duration, Instant, SystemClock};

use crate::error::{BuilderError, ConsumerError};

/// The service expires a cursor five minutes after issuing it. The refresh
/// interval must stay strictly below this.
pub const SERVICE_CURSOR_TTL: Duration = Duration::from_secs(300);

/// Default staleness bound after which a held cursor is re-requested.
pub const DEFAULT_CURSOR_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Default maximum records per retrieval call.
pub const DEFAULT_BATCH_LIMIT: u32 = 50;

/// Owns the cursor for one shard: decides when to refresh it, retrieves
/// record batches, and reconciles every outcome into the cursor used for
/// the next call.
///
/// One instance per shard, driven by exactly one logical task. The
/// instance holds no locks and is not safe for concurrent
/// [`fetch_records`](Self::fetch_records) calls; multi-shard consumption
/// runs one independent manager per shard.
pub struct ShardCursorManager<C, K = SystemClock> {
    stream_name: String,
    shard_id: String,
    cursor_refresh_interval: Duration,
    batch_limit: u32,
    client: C,
    clock: K,
    /// Positioning request most recently issued. Retained to tell whether
    /// a cursor has ever been requested, not for replay.
    last_cursor_request: Option<CursorRequest>,
    last_cursor_request_at: Option<Instant>,
    /// The cursor trusted for the next retrieval unless a refresh
    /// supersedes it. `None` only before the first successful retrieval.
    authoritative_cursor: Option<String>,
}

impl<C> ShardCursorManager<C, SystemClock> {
    pub fn builder() -> ShardCursorManagerBuilder<C, SystemClock> {
        ShardCursorManagerBuilder::new()
    }
}

impl<C, K> ShardCursorManager<C, K> {
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn shard_id(&self) -> &str {
        &self.shard_id
    }

    pub fn cursor_refresh_interval(&self) -> Duration {
        self.cursor_refresh_interval
    }

    pub fn batch_limit(&self) -> u32 {
        self.batch_limit
    }

    /// The cursor that will be used by the next call unless a refresh
    /// supersedes it.
    pub fn authoritative_cursor(&self) -> Option<&str> {
        self.authoritative_cursor.as_deref()
    }
}

impl<C, K> ShardCursorManager<C, K>
where
    C: StreamClient,
    K: Clock,
{
    /// Retrieve the next batch of records from the shard.
    ///
    /// `last_sequence_number` is the sequence number of the last record the
    /// caller has durably processed; `None` or zero means consumption has
    /// not started, in which case a fresh cursor starts at the newest
    /// available data rather than the horizon.
    ///
    /// Performs at most one cursor request and two retrievals, then
    /// returns. Errors propagate unchanged, tagged with the phase that
    /// failed; no retry or backoff happens here.
    pub async fn fetch_records(
        &mut self,
        last_sequence_number: Option<&SequenceNumber>,
    ) -> Result<Vec<Record>, ConsumerError<C::Error>> {
        let (cursor, requested_cursor) = self.resolve_cursor(last_sequence_number).await?;

        let batch = self
            .client
            .get_records(&cursor, self.batch_limit)
            .await
            .map_err(ConsumerError::GetRecords)?;
        tracing::debug!(
            shard_id = %self.shard_id,
            records = batch.records.len(),
            next_cursor = %batch.next_cursor,
            "record request returned"
        );

        let adopted = reconcile(
            self.authoritative_cursor.as_deref(),
            last_sequence_number,
            &RetrievalOutcome {
                used_cursor: &cursor,
                requested_cursor: requested_cursor.as_deref(),
                records: &batch.records,
                next_cursor: &batch.next_cursor,
            },
        );
        self.authoritative_cursor = Some(adopted);

        if !batch.records.is_empty() {
            return Ok(batch.records);
        }

        // One extra hop when the first retrieval came back empty; data may
        // be immediately available one cursor-step ahead. Never loops.
        let retry = self
            .client
            .get_records(&batch.next_cursor, self.batch_limit)
            .await
            .map_err(ConsumerError::GetRecords)?;
        tracing::debug!(
            shard_id = %self.shard_id,
            records = retry.records.len(),
            "empty-batch retry returned"
        );
        Ok(retry.records)
    }

    /// Pick the cursor for this call, requesting a fresh one when none has
    /// ever been requested or the held one has gone stale.
    async fn resolve_cursor(
        &mut self,
        last_sequence_number: Option<&SequenceNumber>,
    ) -> Result<(String, Option<String>), ConsumerError<C::Error>> {
        let mut requested_cursor = None;
        if self.refresh_due() {
            let position = match last_sequence_number {
                Some(last) if !last.is_zero() => CursorPosition::AfterSequenceNumber(last.clone()),
                _ => CursorPosition::Latest,
            };
            tracing::info!(
                shard_id = %self.shard_id,
                ?position,
                "requesting new cursor"
            );
            let request = CursorRequest {
                stream_name: self.stream_name.clone(),
                shard_id: self.shard_id.clone(),
                position,
            };
            let cursor = self
                .client
                .request_cursor(request.clone())
                .await
                .map_err(ConsumerError::CursorRequest)?;
            self.last_cursor_request = Some(request);
            self.last_cursor_request_at = Some(self.clock.now());
            if !cursor.is_empty() {
                requested_cursor = Some(cursor);
            }
        }

        let cursor = match (&requested_cursor, &self.authoritative_cursor) {
            (Some(fresh), _) => fresh.clone(),
            (None, Some(held)) => {
                tracing::debug!(cursor = %held, "no requested cursor, using held value");
                held.clone()
            }
            (None, None) => {
                return Err(ConsumerError::MissingCursor {
                    shard_id: self.shard_id.clone(),
                });
            }
        };
        Ok((cursor, requested_cursor))
    }

    fn refresh_due(&self) -> bool {
        match (&self.last_cursor_request, self.last_cursor_request_at) {
            (Some(_), Some(at)) => {
                self.clock.now().duration_since(at) >= self.cursor_refresh_interval
            }
            _ => true,
        }
    }
}

/// Everything about one retrieval that cursor reconciliation looks at.
struct RetrievalOutcome<'a> {
    used_cursor: &'a str,
    /// `Some` when a refresh happened on this call.
    requested_cursor: Option<&'a str>,
    records: &'a [Record],
    next_cursor: &'a str,
}

/// Select the next authoritative cursor from one retrieval outcome.
///
/// A freshly requested cursor may land arbitrarily far ahead of the
/// caller's position, so it is adopted only on positive evidence: the
/// batch it produced was non-empty, a record in it lies beyond the
/// caller's last processed sequence number, or there is no prior position
/// to protect. Otherwise the service-provided next cursor steps the old
/// position forward. Without a refresh, a productive cursor is kept as-is
/// rather than skipped past; the caller's own sequence tracking absorbs
/// any re-read.
fn reconcile(
    prior: Option<&str>,
    last_sequence_number: Option<&SequenceNumber>,
    outcome: &RetrievalOutcome<'_>,
) -> String {
    if let Some(requested) = outcome.requested_cursor {
        if !outcome.records.is_empty() {
            tracing::debug!("requested cursor produced records, adopting it");
            return requested.to_string();
        }
        if prior.is_none() {
            tracing::debug!("no prior cursor, adopting next cursor from retrieval");
            return outcome.next_cursor.to_string();
        }
        let beyond_caller = outcome.records.iter().any(|record| {
            last_sequence_number.map_or(true, |last| record.sequence_number > *last)
        });
        if beyond_caller {
            tracing::debug!("record beyond caller position, adopting requested cursor");
            requested.to_string()
        } else {
            tracing::debug!("no record beyond caller position, adopting next cursor");
            outcome.next_cursor.to_string()
        }
    } else if outcome.records.is_empty() {
        tracing::debug!("held cursor exhausted, adopting next cursor");
        outcome.next_cursor.to_string()
    } else {
        tracing::debug!("held cursor produced records, keeping it");
        outcome.used_cursor.to_string()
    }
}

/// Builder for [`ShardCursorManager`].
///
/// `stream_name`, `shard_id` and `client` are required; the refresh
/// interval and batch limit default to [`DEFAULT_CURSOR_REFRESH_INTERVAL`]
/// and [`DEFAULT_BATCH_LIMIT`], and the clock to [`SystemClock`].
pub struct ShardCursorManagerBuilder<C, K = SystemClock> {
    stream_name: Option<String>,
    shard_id: Option<String>,
    client: Option<C>,
    clock: K,
    cursor_refresh_interval: Duration,
    batch_limit: u32,
}

impl<C> ShardCursorManagerBuilder<C, SystemClock> {
    pub fn new() -> Self {
        Self {
            stream_name: None,
            shard_id: None,
            client: None,
            clock: SystemClock,
            cursor_refresh_interval: DEFAULT_CURSOR_REFRESH_INTERVAL,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }
}

impl<C> Default for ShardCursorManagerBuilder<C, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, K> ShardCursorManagerBuilder<C, K> {
    pub fn stream_name(mut self, stream_name: impl Into<String>) -> Self {
        self.stream_name = Some(stream_name.into());
        self
    }

    pub fn shard_id(mut self, shard_id: impl Into<String>) -> Self {
        self.shard_id = Some(shard_id.into());
        self
    }

    pub fn client(mut self, client: C) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace the clock, usually with a manual one in tests.
    pub fn clock<K2>(self, clock: K2) -> ShardCursorManagerBuilder<C, K2> {
        ShardCursorManagerBuilder {
            stream_name: self.stream_name,
            shard_id: self.shard_id,
            client: self.client,
            clock,
            cursor_refresh_interval: self.cursor_refresh_interval,
            batch_limit: self.batch_limit,
        }
    }

    pub fn cursor_refresh_interval(mut self, interval: Duration) -> Self {
        self.cursor_refresh_interval = interval;
        self
    }

    pub fn batch_limit(mut self, limit: u32) -> Self {
        self.batch_limit = limit;
        self
    }

    pub fn build(self) -> Result<ShardCursorManager<C, K>, BuilderError> {
        if self.cursor_refresh_interval >= SERVICE_CURSOR_TTL {
            return Err(BuilderError::RefreshIntervalTooLong {
                interval: self.cursor_refresh_interval,
            });
        }
        Ok(ShardCursorManager {
            stream_name: self
                .stream_name
                .ok_or(BuilderError::MissingField("stream_name"))?,
            shard_id: self.shard_id.ok_or(BuilderError::MissingField("shard_id"))?,
            cursor_refresh_interval: self.cursor_refresh_interval,
            batch_limit: self.batch_limit,
            client: self.client.ok_or(BuilderError::MissingField("client"))?,
            clock: self.clock,
            last_cursor_request: None,
            last_cursor_request_at: None,
            authoritative_cursor: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_client::test_utils::{build_records, FixtureStreamClient, MockStreamClient};
    use shard_client::RecordBatch;

    fn outcome<'a>(
        used: &'a str,
        requested: Option<&'a str>,
        records: &'a [Record],
        next: &'a str,
    ) -> RetrievalOutcome<'a> {
        RetrievalOutcome {
            used_cursor: used,
            requested_cursor: requested,
            records,
            next_cursor: next,
        }
    }

    #[test]
    fn reconcile_adopts_requested_cursor_when_productive() {
        let records = build_records([11, 12], "pk");
        let adopted = reconcile(
            Some("held"),
            Some(&SequenceNumber::from(10)),
            &outcome("fresh", Some("fresh"), &records, "next"),
        );
        assert_eq!(adopted, "fresh");
    }

    #[test]
    fn reconcile_bootstraps_from_next_cursor_without_prior() {
        let adopted = reconcile(None, None, &outcome("fresh", Some("fresh"), &[], "next"));
        assert_eq!(adopted, "next");
    }

    #[test]
    fn reconcile_steps_forward_when_requested_cursor_is_barren() {
        // the comparison rule over zero records finds nothing beyond the
        // caller, so the old position steps forward instead of jumping
        let adopted = reconcile(
            Some("held"),
            Some(&SequenceNumber::from(10)),
            &outcome("fresh", Some("fresh"), &[], "next"),
        );
        assert_eq!(adopted, "next");
    }

    #[test]
    fn reconcile_advances_exhausted_held_cursor() {
        let adopted = reconcile(
            Some("held"),
            Some(&SequenceNumber::from(10)),
            &outcome("held", None, &[], "next"),
        );
        assert_eq!(adopted, "next");
    }

    #[test]
    fn reconcile_keeps_productive_held_cursor() {
        let records = build_records([11], "pk");
        let adopted = reconcile(
            Some("held"),
            Some(&SequenceNumber::from(10)),
            &outcome("held", None, &records, "next"),
        );
        assert_eq!(adopted, "held");
    }

    #[test]
    fn builder_applies_defaults() {
        let manager = ShardCursorManager::builder()
            .stream_name("orders")
            .shard_id("shardId-000000000000")
            .client(FixtureStreamClient::new())
            .build()
            .unwrap();
        assert_eq!(manager.cursor_refresh_interval(), DEFAULT_CURSOR_REFRESH_INTERVAL);
        assert_eq!(manager.batch_limit(), DEFAULT_BATCH_LIMIT);
        assert_eq!(manager.stream_name(), "orders");
        assert_eq!(manager.shard_id(), "shardId-000000000000");
        assert!(manager.authoritative_cursor().is_none());
    }

    #[test]
    fn builder_rejects_missing_fields() {
        let result = ShardCursorManager::<FixtureStreamClient>::builder()
            .shard_id("shardId-000000000000")
            .client(FixtureStreamClient::new())
            .build();
        assert_eq!(result.err(), Some(BuilderError::MissingField("stream_name")));
    }

    #[test]
    fn builder_rejects_interval_at_or_above_service_ttl() {
        let result = ShardCursorManager::builder()
            .stream_name("orders")
            .shard_id("shardId-000000000000")
            .client(FixtureStreamClient::new())
            .cursor_refresh_interval(SERVICE_CURSOR_TTL)
            .build();
        assert!(matches!(
            result.err(),
            Some(BuilderError::RefreshIntervalTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn first_fetch_requests_latest_and_retries_once_on_empty() {
        let mut client = MockStreamClient::new();
        client
            .expect_request_cursor()
            .times(1)
            .withf(|request| request.position == CursorPosition::Latest)
            .returning(|_| Ok("c-0".to_string()));
        client.expect_get_records().times(2).returning(|cursor, _| {
            Ok(RecordBatch {
                records: vec![],
                next_cursor: format!("{cursor}+1"),
            })
        });

        let mut manager = ShardCursorManager::builder()
            .stream_name("orders")
            .shard_id("shardId-000000000000")
            .client(client)
            .build()
            .unwrap();
        let records = manager.fetch_records(None).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(manager.authoritative_cursor(), Some("c-0+1"));
    }
}

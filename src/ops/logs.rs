//! Concurrent Log Fetcher
//!
//! Fans log retrieval out across compute units and their log streams, then
//! merges everything into one timestamp-ordered list. A backend error on any
//! single unit or stream contributes zero entries rather than failing the
//! whole fetch: observability queries degrade gracefully.

use crate::component::LogEntry;
use anyhow::Result;
use futures::future::join_all;
use regex::Regex;
use std::sync::OnceLock;

/// Lambda log groups are named after the function id.
const LOG_GROUP_PREFIX: &str = "/aws/lambda/";

/// One raw event as read from a backend log stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLogEvent {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// Backend seam for log retrieval. The production implementation wraps the
/// CloudWatch Logs client; tests substitute an in-memory store.
#[allow(async_fn_in_trait)]
pub trait LogStore {
    async fn list_streams(&self, group: &str) -> Result<Vec<String>>;
    async fn get_events(&self, group: &str, stream: &str) -> Result<Vec<RawLogEvent>>;
}

/// Raw Lambda log lines carry a timestamp and request id before the payload:
/// `2017-09-22T01:02:03.456Z\t<request-id>\t<message>`. Only the trailing
/// message is kept. Lines that do not match are dropped silently; whether
/// that loses legitimate unstructured output is an open upstream question.
fn log_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r".*Z\t[a-g0-9\-]*\t(.*)").expect("valid log line pattern"))
}

/// Extract the message payload from a raw provider log line.
pub fn extract_message(line: &str) -> Option<&str> {
    log_line_pattern()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Fetch logs for one compute unit, merged and sorted ascending by timestamp.
pub async fn fetch_function_logs<S: LogStore + Sync>(store: &S, function_id: &str) -> Vec<LogEntry> {
    let mut entries = fetch_unit(store, function_id).await;
    entries.sort_by_key(|entry| entry.timestamp);
    entries
}

/// Fetch logs for a set of compute units concurrently, one task per unit,
/// merged and stably sorted ascending by timestamp.
///
/// There is no concurrency cap: pathological inputs with thousands of streams
/// can exhaust backend rate limits. Callers needing a deadline must impose it
/// around the whole call.
pub async fn fetch_all_logs<S: LogStore + Sync>(store: &S, function_ids: &[String]) -> Vec<LogEntry> {
    let tasks = function_ids.iter().map(|id| fetch_unit(store, id));
    let mut entries: Vec<LogEntry> = join_all(tasks).await.into_iter().flatten().collect();
    entries.sort_by_key(|entry| entry.timestamp);
    entries
}

/// One unit: list its streams, then read every stream concurrently. Each task
/// produces an independent result; aggregation happens only after all tasks
/// complete, so the merge needs no locking.
async fn fetch_unit<S: LogStore + Sync>(store: &S, function_id: &str) -> Vec<LogEntry> {
    let group = format!("{}{}", LOG_GROUP_PREFIX, function_id);

    let streams = match store.list_streams(&group).await {
        Ok(streams) => streams,
        Err(err) => {
            tracing::debug!("error listing log streams for {}: {:#}", group, err);
            return Vec::new();
        }
    };

    let tasks = streams
        .iter()
        .map(|stream| fetch_stream(store, function_id, &group, stream));
    join_all(tasks).await.into_iter().flatten().collect()
}

async fn fetch_stream<S: LogStore + Sync>(
    store: &S,
    function_id: &str,
    group: &str,
    stream: &str,
) -> Vec<LogEntry> {
    let events = match store.get_events(group, stream).await {
        Ok(events) => events,
        Err(err) => {
            tracing::debug!("error reading log stream {}/{}: {:#}", group, stream, err);
            return Vec::new();
        }
    };

    events
        .iter()
        .filter_map(|event| {
            extract_message(&event.message).map(|message| LogEntry {
                id: function_id.to_string(),
                timestamp: event.timestamp,
                message: message.to_string(),
            })
        })
        .collect()
}

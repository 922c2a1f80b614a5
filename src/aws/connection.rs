//! Provider Connection
//!
//! Bundles the backend session with a log-query client and a metric-query
//! client. Constructed once and shared read-only by every operations provider
//! bound to the same session.

use crate::ops::logs::{LogStore, RawLogEvent};
use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, SdkConfig};

/// Handle to the CloudWatch backends. No mutation after construction.
#[derive(Clone)]
pub struct Connection {
    pub logs: aws_sdk_cloudwatchlogs::Client,
    pub metrics: aws_sdk_cloudwatch::Client,
}

impl Connection {
    /// Create a connection from the ambient AWS environment (credentials
    /// chain, `AWS_REGION`, profile).
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_conf(&config)
    }

    /// Create a connection from a caller-supplied session.
    pub fn from_conf(config: &SdkConfig) -> Self {
        Self {
            logs: aws_sdk_cloudwatchlogs::Client::new(config),
            metrics: aws_sdk_cloudwatch::Client::new(config),
        }
    }
}

impl LogStore for Connection {
    async fn list_streams(&self, group: &str) -> Result<Vec<String>> {
        let mut streams = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut req = self.logs.describe_log_streams().log_group_name(group);
            if let Some(token) = next_token.take() {
                req = req.next_token(token);
            }
            let resp = req
                .send()
                .await
                .with_context(|| format!("Failed to describe log streams for {}", group))?;

            streams.extend(
                resp.log_streams()
                    .iter()
                    .filter_map(|s| s.log_stream_name().map(str::to_string)),
            );

            match resp.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(streams)
    }

    async fn get_events(&self, group: &str, stream: &str) -> Result<Vec<RawLogEvent>> {
        let resp = self
            .logs
            .get_log_events()
            .log_group_name(group)
            .log_stream_name(stream)
            .start_from_head(true)
            .send()
            .await
            .with_context(|| format!("Failed to get log events for {}/{}", group, stream))?;

        Ok(resp
            .events()
            .iter()
            .map(|event| RawLogEvent {
                timestamp: event.timestamp().unwrap_or_default(),
                message: event.message().unwrap_or_default().to_string(),
            })
            .collect())
    }
}

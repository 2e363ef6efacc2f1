// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Span stream seam.
//!
//! The long-lived push connection to the trace observer is owned by a
//! [`StreamingChannel`] implementation; connection handling, retries and
//! backoff belong there. The session only decides when to create one.

use crate::payload::SpanEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc::Receiver, Mutex};

/// Callback used by the channel to record supportability metrics.
pub type MetricRecorderFn = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Lifecycle of a session's span stream. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStreamState {
    Absent,
    Active,
    Closed,
}

impl Default for SpanStreamState {
    fn default() -> Self {
        Self::Absent
    }
}

/// Everything a channel needs to reach the trace observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanChannelParams {
    /// `host:port`
    pub endpoint: String,
    /// Ordered auth headers: agent run token first, then license key.
    pub metadata: Vec<(String, String)>,
    pub ssl: bool,
    pub compression: bool,
}

/// Spans produced by application threads, consumed by the channel.
#[async_trait]
pub trait SpanSource: Send + Sync {
    /// Next span to push, or `None` once the producers are gone.
    async fn next_span(&self) -> Option<SpanEvent>;
}

#[async_trait]
pub trait StreamingChannel: Send + Sync {
    async fn connect(&self);

    /// Must be safe to call even if `connect` never ran.
    async fn close(&self);
}

pub trait StreamingChannelFactory: Send + Sync {
    fn create(
        &self,
        params: SpanChannelParams,
        span_source: Arc<dyn SpanSource>,
        record_metric: MetricRecorderFn,
    ) -> Arc<dyn StreamingChannel>;
}

/// [`SpanSource`] fed through a tokio mpsc channel.
pub struct ChannelSpanSource {
    rx: Mutex<Receiver<SpanEvent>>,
}

impl ChannelSpanSource {
    pub fn new(rx: Receiver<SpanEvent>) -> Self {
        ChannelSpanSource { rx: Mutex::new(rx) }
    }
}

#[async_trait]
impl SpanSource for ChannelSpanSource {
    async fn next_span(&self) -> Option<SpanEvent> {
        self.rx.lock().await.recv().await
    }
}

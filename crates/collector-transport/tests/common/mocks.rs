// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Recording implementations of the protocol and span stream seams

use collector_transport::error::ProtocolError;
use collector_transport::protocol::{
    CollectorReply, ConnectParams, Protocol, ProtocolConnector, ProtocolKind,
};
use collector_transport::streaming::{
    MetricRecorderFn, SpanChannelParams, SpanSource, StreamingChannel, StreamingChannelFactory,
};
use collector_transport::{SessionMode, Settings};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const AGENT_RUN_ID: &str = "run-1234";

#[derive(Clone, Debug, PartialEq)]
pub struct SentRequest {
    pub kind: ProtocolKind,
    pub method: String,
    pub payload: Value,
    pub path: Option<String>,
}

/// Connector handing out [`MockProtocol`]s that all record into one log.
#[derive(Clone, Default)]
pub struct MockConnector {
    pub connects: Arc<Mutex<Vec<(ProtocolKind, SessionMode)>>>,
    pub sent: Arc<Mutex<Vec<SentRequest>>>,
    pub closed: Arc<AtomicUsize>,
    pub finalized: Arc<AtomicUsize>,
    /// Protocol kind whose handshake fails
    pub fail_on: Option<ProtocolKind>,
    /// Reply every protocol returns from `send`
    pub reply: CollectorReply,
}

impl MockConnector {
    pub fn failing_on(kind: ProtocolKind) -> Self {
        MockConnector {
            fail_on: Some(kind),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn connected_kinds(&self) -> Vec<ProtocolKind> {
        self.connects
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[async_trait::async_trait]
impl ProtocolConnector for MockConnector {
    async fn connect(
        &self,
        kind: ProtocolKind,
        mode: SessionMode,
        params: &ConnectParams,
    ) -> Result<Box<dyn Protocol>, ProtocolError> {
        self.connects.lock().unwrap().push((kind, mode));
        if self.fail_on == Some(kind) {
            return Err(ProtocolError::Connection(format!("{kind} handshake refused")));
        }

        let mut configuration = (*params.settings).clone();
        configuration.agent_run_id = Some(AGENT_RUN_ID.to_string());
        Ok(Box::new(MockProtocol {
            kind,
            configuration,
            sent: Arc::clone(&self.sent),
            closed: Arc::clone(&self.closed),
            finalized: Arc::clone(&self.finalized),
            reply: self.reply.clone(),
        }))
    }
}

pub struct MockProtocol {
    kind: ProtocolKind,
    configuration: Settings,
    sent: Arc<Mutex<Vec<SentRequest>>>,
    closed: Arc<AtomicUsize>,
    finalized: Arc<AtomicUsize>,
    reply: CollectorReply,
}

#[async_trait::async_trait]
impl Protocol for MockProtocol {
    fn configuration(&self) -> &Settings {
        &self.configuration
    }

    async fn send(
        &self,
        method: &str,
        payload: Value,
        path: Option<&str>,
    ) -> Result<CollectorReply, ProtocolError> {
        self.sent.lock().unwrap().push(SentRequest {
            kind: self.kind,
            method: method.to_string(),
            payload,
            path: path.map(str::to_string),
        });
        Ok(self.reply.clone())
    }

    async fn close_connection(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    async fn finalize(&self) -> Result<(), ProtocolError> {
        self.finalized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Protocol whose every send fails, to check errors propagate untouched.
pub struct RejectingConnector;

#[async_trait::async_trait]
impl ProtocolConnector for RejectingConnector {
    async fn connect(
        &self,
        _kind: ProtocolKind,
        _mode: SessionMode,
        params: &ConnectParams,
    ) -> Result<Box<dyn Protocol>, ProtocolError> {
        Ok(Box::new(RejectingProtocol {
            configuration: (*params.settings).clone(),
        }))
    }
}

struct RejectingProtocol {
    configuration: Settings,
}

#[async_trait::async_trait]
impl Protocol for RejectingProtocol {
    fn configuration(&self) -> &Settings {
        &self.configuration
    }

    async fn send(
        &self,
        _method: &str,
        _payload: Value,
        _path: Option<&str>,
    ) -> Result<CollectorReply, ProtocolError> {
        Err(ProtocolError::Rejected {
            status: 413,
            message: "payload too large".to_string(),
        })
    }

    async fn close_connection(&self) {}

    async fn finalize(&self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockChannelFactory {
    pub created: Arc<Mutex<Vec<SpanChannelParams>>>,
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl MockChannelFactory {
    pub fn created(&self) -> Vec<SpanChannelParams> {
        self.created.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl StreamingChannelFactory for MockChannelFactory {
    fn create(
        &self,
        params: SpanChannelParams,
        _span_source: Arc<dyn SpanSource>,
        _record_metric: MetricRecorderFn,
    ) -> Arc<dyn StreamingChannel> {
        self.created.lock().unwrap().push(params);
        Arc::new(MockChannel {
            connects: Arc::clone(&self.connects),
            closes: Arc::clone(&self.closes),
        })
    }
}

pub struct MockChannel {
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl StreamingChannel for MockChannel {
    async fn connect(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

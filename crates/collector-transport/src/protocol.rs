// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire protocol seam.
//!
//! Handshake, HTTP transport, compression, retries and serialization all live
//! behind [`Protocol`]. The session only decides which protocol carries which
//! payload.

use crate::error::ProtocolError;
use crate::mode::SessionMode;
use crate::settings::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// `(name, value)` pairs describing the host process and its runtime.
pub type Environment = Vec<(String, Value)>;

/// What the collector answers to a submission: nothing, or commands for the agent.
pub type CollectorReply = Option<Vec<AgentCommand>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    /// Classic request/response collector protocol.
    Agent,
    /// OTLP-formatted protocol for ML events and dimensional metrics.
    Otlp,
    /// Primary protocol tuned for request-scoped environments.
    Serverless,
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::Otlp => write!(f, "otlp"),
            Self::Serverless => write!(f, "serverless"),
        }
    }
}

/// Command issued by the collector, e.g. start a profiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCommand {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Application identity shared by every protocol connected for a session.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub app_name: String,
    pub linked_applications: Vec<String>,
    pub environment: Environment,
    pub settings: Arc<Settings>,
}

#[async_trait]
pub trait Protocol: Send + Sync {
    /// Settings as they stand after connecting, including the agent run id.
    fn configuration(&self) -> &Settings;

    /// Submit `payload` to the collector method `method`. OTLP protocols also
    /// take the sub-path the payload is posted to.
    async fn send(
        &self,
        method: &str,
        payload: Value,
        path: Option<&str>,
    ) -> Result<CollectorReply, ProtocolError>;

    async fn close_connection(&self);

    /// Flush and release whatever the protocol still holds.
    async fn finalize(&self) -> Result<(), ProtocolError>;
}

/// Establishes protocols against the collector.
#[async_trait]
pub trait ProtocolConnector: Send + Sync {
    /// Connect a protocol of the given kind. `mode` selects the HTTP client
    /// flavor the protocol should use.
    async fn connect(
        &self,
        kind: ProtocolKind,
        mode: SessionMode,
        params: &ConnectParams,
    ) -> Result<Box<dyn Protocol>, ProtocolError>;
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::protocol::ProtocolKind;

/// Errors surfaced by a [`Protocol`](crate::protocol::Protocol) implementation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to connect to collector: {0}")]
    Connection(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Collector rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur when creating or driving a collector session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to connect {kind} protocol: {source}")]
    Connect {
        kind: ProtocolKind,
        #[source]
        source: ProtocolError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    #[error("Attribute {name:?} could not be processed: {reason}")]
    Invalid { name: String, reason: String },
}

/// Faults raised while assembling the shared log attribute block.
#[derive(Debug, thiserror::Error)]
pub enum CommonBlockError {
    #[error("Custom attribute processing failed: {0}")]
    Attribute(#[from] AttributeError),
}

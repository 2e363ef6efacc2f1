// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Session modes.
//!
//! The mode is chosen once, when the session is created, and decides the
//! primary protocol flavor plus the behavior of the three mode-sensitive
//! operations:
//!
//! 1. **Application** - full behavior, the default
//! 2. **Developer** - span stream only when the debug flag asks for it
//! 3. **Serverless** - request-scoped primary protocol, no span stream, no
//!    agent command polling and no shutdown call
//!
//! See [`SessionMode`] for the predicates the session consults.

use crate::protocol::ProtocolKind;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Long-lived agent run against the collector.
    Application,

    /// Same as [`SessionMode::Application`], but the span stream is opened only
    /// when `debug.connect_span_stream_in_developer_mode` is set.
    Developer,

    /// Request/response scoped environments.
    ///
    /// - Uses the serverless primary protocol
    /// - Never opens a span stream
    /// - Agent commands are never polled
    /// - There is no persistent run to deregister at shutdown
    Serverless,
}

impl SessionMode {
    /// Pick the mode from process-wide settings. Serverless wins over developer.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.serverless_mode.enabled {
            Self::Serverless
        } else if settings.developer_mode {
            Self::Developer
        } else {
            Self::Application
        }
    }

    /// Protocol used for the primary (non OTLP) channel.
    pub const fn primary_protocol(self) -> ProtocolKind {
        match self {
            Self::Application | Self::Developer => ProtocolKind::Agent,
            Self::Serverless => ProtocolKind::Serverless,
        }
    }

    /// Returns true if this mode may open a span stream with these settings.
    pub fn allows_span_stream(self, settings: &Settings) -> bool {
        match self {
            Self::Application => true,
            Self::Developer => settings.debug.connect_span_stream_in_developer_mode,
            Self::Serverless => false,
        }
    }

    /// Returns true if agent commands are fetched from the collector.
    pub const fn polls_agent_commands(self) -> bool {
        !matches!(self, Self::Serverless)
    }

    /// Returns true if the agent run is deregistered at shutdown.
    pub const fn deregisters_on_shutdown(self) -> bool {
        !matches!(self, Self::Serverless)
    }
}

impl Default for SessionMode {
    fn default() -> Self {
        Self::Application
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
            Self::Developer => write!(f, "developer"),
            Self::Serverless => write!(f, "serverless"),
        }
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process-wide agent settings read by the collector session.
//!
//! The host owns loading; this module only models the snapshot the session
//! reads and offers a global slot to publish it in. Every section deserializes
//! with defaults so partial documents are accepted.

use crate::constants::DEFAULT_TRACE_OBSERVER_PORT;
use crate::error::SessionError;
use serde::Deserialize;
use serde_json::Value;
use std::net::Ipv6Addr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub license_key: String,
    /// Assigned by the collector during connect.
    pub agent_run_id: Option<String>,
    pub developer_mode: bool,
    pub serverless_mode: ServerlessModeSettings,
    pub debug: DebugSettings,
    pub distributed_tracing: DistributedTracingSettings,
    pub span_events: SpanEventSettings,
    pub collect_span_events: bool,
    pub infinite_tracing: InfiniteTracingSettings,
    pub application_logging: ApplicationLoggingSettings,
    pub labels: Vec<Label>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            license_key: String::new(),
            agent_run_id: None,
            developer_mode: false,
            serverless_mode: ServerlessModeSettings::default(),
            debug: DebugSettings::default(),
            distributed_tracing: DistributedTracingSettings::default(),
            span_events: SpanEventSettings::default(),
            collect_span_events: true,
            infinite_tracing: InfiniteTracingSettings::default(),
            application_logging: ApplicationLoggingSettings::default(),
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerlessModeSettings {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub connect_span_stream_in_developer_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DistributedTracingSettings {
    pub enabled: bool,
}

impl Default for DistributedTracingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpanEventSettings {
    pub enabled: bool,
}

impl Default for SpanEventSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Trace observer (span stream) connection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfiniteTracingSettings {
    /// Empty when no trace observer is configured
    pub trace_observer_host: String,
    pub trace_observer_port: u16,
    pub ssl: bool,
    pub compression: bool,
}

impl Default for InfiniteTracingSettings {
    fn default() -> Self {
        Self {
            trace_observer_host: String::new(),
            trace_observer_port: DEFAULT_TRACE_OBSERVER_PORT,
            ssl: true,
            compression: true,
        }
    }
}

impl InfiniteTracingSettings {
    pub fn host(&self) -> Option<&str> {
        let host = self.trace_observer_host.trim();
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }

    /// Build the `host:port` endpoint of the trace observer at `host`.
    /// IPv6 literals are bracketed, with or without brackets in the setting.
    pub fn endpoint(&self, host: &str) -> Result<String, SessionError> {
        if host.contains("://") {
            return Err(SessionError::InvalidConfig(format!(
                "Trace observer host '{host}' must not include a scheme"
            )));
        }
        let port = self.trace_observer_port;
        if port == 0 {
            return Err(SessionError::InvalidConfig(
                "Trace observer port must be greater than 0".to_string(),
            ));
        }

        let literal = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if literal.parse::<Ipv6Addr>().is_ok() {
            return Ok(format!("[{literal}]:{port}"));
        }
        if host.contains(':') {
            return Err(SessionError::InvalidConfig(format!(
                "Trace observer host '{host}' must not include a port"
            )));
        }
        Ok(format!("{host}:{port}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApplicationLoggingSettings {
    pub forwarding: LogForwardingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogForwardingSettings {
    /// `(name, value)` pairs attached to every log payload, in configured order.
    pub custom_attributes: Vec<(String, Value)>,
    pub labels: LabelForwardingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelForwardingSettings {
    pub enabled: bool,
    /// Label types that must not be forwarded. Matched case-insensitively.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Label {
    pub label_type: String,
    pub label_value: String,
}

impl Label {
    pub fn new(label_type: &str, label_value: &str) -> Self {
        Self {
            label_type: label_type.to_string(),
            label_value: label_value.to_string(),
        }
    }
}

static GLOBAL_SETTINGS: OnceLock<RwLock<Arc<Settings>>> = OnceLock::new();

fn global_slot() -> &'static RwLock<Arc<Settings>> {
    GLOBAL_SETTINGS.get_or_init(|| RwLock::new(Arc::new(Settings::default())))
}

/// Current process-wide settings snapshot.
pub fn global_settings() -> Arc<Settings> {
    let guard = global_slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&*guard)
}

/// Publish a new process-wide settings snapshot. Sessions already created keep
/// the snapshot they were built from.
pub fn set_global_settings(settings: Settings) {
    let mut guard = global_slot()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Arc::new(settings);
}

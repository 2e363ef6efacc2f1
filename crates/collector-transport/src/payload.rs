// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Harvest data types handed to the session.
//!
//! Collections that the session forwards untouched (traces, errors, metric
//! data, ...) are accepted as any `Serialize` item; the types here are the ones
//! the session or its encoders look inside.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reservoir statistics sent alongside sampled event sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SamplingInfo {
    pub reservoir_size: usize,
    pub events_seen: usize,
}

impl SamplingInfo {
    pub fn new(reservoir_size: usize, events_seen: usize) -> Self {
        Self {
            reservoir_size,
            events_seen,
        }
    }
}

/// Span event, serialized as `[intrinsics, user_attributes, agent_attributes]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanEvent {
    pub intrinsics: Map<String, Value>,
    pub user_attributes: Map<String, Value>,
    pub agent_attributes: Map<String, Value>,
}

impl Serialize for SpanEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (
            &self.intrinsics,
            &self.user_attributes,
            &self.agent_attributes,
        )
            .serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogRecord {
    /// Milliseconds since the UNIX epoch
    pub timestamp: u64,
    pub level: String,
    pub message: String,
    #[serde(rename = "trace.id", skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(rename = "span.id", skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// Machine learning inference event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MlEvent {
    pub event_type: String,
    /// Milliseconds since the UNIX epoch
    pub timestamp_ms: u64,
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(f64),
    Summary {
        count: u64,
        sum: f64,
        min: f64,
        max: f64,
    },
}

/// Metric keyed by name plus tag set, reported through OTLP.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionalMetric {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub value: MetricValue,
}

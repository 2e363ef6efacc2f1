// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! OTLP/JSON encoders for the payloads routed through the OTLP protocol.

use crate::constants::{INSTRUMENTATION_PROVIDER, ML_EVENT_DOMAIN};
use crate::payload::{DimensionalMetric, MetricValue, MlEvent};
use serde_json::{json, Value};

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: f64 = 1e9;

// OTLP AggregationTemporality
const AGGREGATION_TEMPORALITY_DELTA: u8 = 1;

fn any_value(value: &Value) -> Value {
    match value {
        Value::String(s) => json!({ "stringValue": s }),
        Value::Bool(b) => json!({ "boolValue": b }),
        // OTLP/JSON carries 64-bit integers as decimal strings
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "intValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n.as_f64() }),
        other => json!({ "stringValue": other.to_string() }),
    }
}

fn key_value(key: &str, value: &Value) -> Value {
    json!({ "key": key, "value": any_value(value) })
}

fn resource() -> Value {
    json!({
        "attributes": [key_value(
            "instrumentation.provider",
            &Value::from(INSTRUMENTATION_PROVIDER)
        )]
    })
}

fn scope() -> Value {
    json!({ "name": INSTRUMENTATION_PROVIDER })
}

fn secs_to_nanos(secs: f64) -> String {
    // Saturating float to int conversion; negative times clamp to 0
    ((secs * NANOS_PER_SEC) as u64).to_string()
}

/// Encode ML events as an OTLP `LogsData` document.
pub fn encode_ml_event_data(events: &[MlEvent], agent_run_id: &str) -> Value {
    let log_records: Vec<Value> = events
        .iter()
        .map(|event| {
            let mut attributes: Vec<Value> = event
                .attributes
                .iter()
                .map(|(key, value)| key_value(key, value))
                .collect();
            attributes.push(key_value("real_agent_id", &Value::from(agent_run_id)));
            attributes.push(key_value("event.domain", &Value::from(ML_EVENT_DOMAIN)));
            attributes.push(key_value("event.name", &Value::from(event.event_type.as_str())));

            let time_unix_nano = event.timestamp_ms.saturating_mul(NANOS_PER_MILLI).to_string();
            json!({
                "timeUnixNano": time_unix_nano,
                "observedTimeUnixNano": time_unix_nano,
                "attributes": attributes,
            })
        })
        .collect();

    json!({
        "resourceLogs": [{
            "resource": resource(),
            "scopeLogs": [{
                "scope": scope(),
                "logRecords": log_records,
            }],
        }],
    })
}

/// Encode dimensional metrics for the `[start_time, end_time]` window, both in
/// seconds since the UNIX epoch, as an OTLP `MetricsData` document.
pub fn encode_metric_data(metrics: &[DimensionalMetric], start_time: f64, end_time: f64) -> Value {
    let start = secs_to_nanos(start_time);
    let end = secs_to_nanos(end_time);

    let encoded: Vec<Value> = metrics
        .iter()
        .map(|metric| {
            let attributes: Vec<Value> = metric
                .tags
                .iter()
                .map(|(key, value)| key_value(key, &Value::from(value.as_str())))
                .collect();

            match metric.value {
                MetricValue::Count(value) => json!({
                    "name": metric.name,
                    "sum": {
                        "aggregationTemporality": AGGREGATION_TEMPORALITY_DELTA,
                        "isMonotonic": true,
                        "dataPoints": [{
                            "attributes": attributes,
                            "startTimeUnixNano": start,
                            "timeUnixNano": end,
                            "asDouble": value,
                        }],
                    },
                }),
                MetricValue::Summary {
                    count,
                    sum,
                    min,
                    max,
                } => json!({
                    "name": metric.name,
                    "summary": {
                        "dataPoints": [{
                            "attributes": attributes,
                            "startTimeUnixNano": start,
                            "timeUnixNano": end,
                            "count": count.to_string(),
                            "sum": sum,
                            "quantileValues": [
                                { "quantile": 0.0, "value": min },
                                { "quantile": 1.0, "value": max },
                            ],
                        }],
                    },
                }),
            }
        })
        .collect();

    json!({
        "resourceMetrics": [{
            "resource": resource(),
            "scopeMetrics": [{
                "scope": scope(),
                "metrics": encoded,
            }],
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_any_value_mapping() {
        assert_eq!(any_value(&json!("a")), json!({"stringValue": "a"}));
        assert_eq!(any_value(&json!(true)), json!({"boolValue": true}));
        assert_eq!(any_value(&json!(-3)), json!({"intValue": "-3"}));
        assert_eq!(any_value(&json!(2.5)), json!({"doubleValue": 2.5}));
        assert_eq!(any_value(&json!([1])), json!({"stringValue": "[1]"}));
    }

    #[test]
    fn test_encode_ml_event_data() {
        let event = MlEvent {
            event_type: "InferenceData".to_string(),
            timestamp_ms: 1_700_000_000_123,
            attributes: BTreeMap::from([("model".to_string(), json!("churn-v2"))]),
        };

        let payload = encode_ml_event_data(&[event], "run-42");
        let record = &payload["resourceLogs"][0]["scopeLogs"][0]["logRecords"][0];

        assert_eq!(record["timeUnixNano"], json!("1700000000123000000"));
        let attributes = record["attributes"]
            .as_array()
            .expect("attributes should be an array");
        assert!(attributes.contains(&json!({"key": "model", "value": {"stringValue": "churn-v2"}})));
        assert!(attributes.contains(&json!({"key": "real_agent_id", "value": {"stringValue": "run-42"}})));
        assert!(attributes
            .contains(&json!({"key": "event.domain", "value": {"stringValue": "newrelic.ml_events"}})));
        assert!(attributes
            .contains(&json!({"key": "event.name", "value": {"stringValue": "InferenceData"}})));
    }

    #[test]
    fn test_encode_ml_event_data_empty() {
        let payload = encode_ml_event_data(&[], "run-42");
        assert_eq!(
            payload["resourceLogs"][0]["scopeLogs"][0]["logRecords"],
            json!([])
        );
    }

    #[test]
    fn test_encode_count_metric() {
        let metric = DimensionalMetric {
            name: "Inference/Requests".to_string(),
            tags: BTreeMap::from([("model".to_string(), "churn-v2".to_string())]),
            value: MetricValue::Count(3.0),
        };

        let payload = encode_metric_data(&[metric], 10.0, 70.0);
        let encoded = &payload["resourceMetrics"][0]["scopeMetrics"][0]["metrics"][0];

        assert_eq!(encoded["name"], json!("Inference/Requests"));
        assert_eq!(encoded["sum"]["isMonotonic"], json!(true));
        let point = &encoded["sum"]["dataPoints"][0];
        assert_eq!(point["startTimeUnixNano"], json!("10000000000"));
        assert_eq!(point["timeUnixNano"], json!("70000000000"));
        assert_eq!(point["asDouble"], json!(3.0));
        assert_eq!(
            point["attributes"],
            json!([{"key": "model", "value": {"stringValue": "churn-v2"}}])
        );
    }

    #[test]
    fn test_encode_summary_metric() {
        let metric = DimensionalMetric {
            name: "Inference/Latency".to_string(),
            tags: BTreeMap::new(),
            value: MetricValue::Summary {
                count: 4,
                sum: 10.0,
                min: 1.0,
                max: 4.0,
            },
        };

        let payload = encode_metric_data(&[metric], 0.0, 60.0);
        let point = &payload["resourceMetrics"][0]["scopeMetrics"][0]["metrics"][0]["summary"]
            ["dataPoints"][0];

        assert_eq!(point["count"], json!("4"));
        assert_eq!(point["sum"], json!(10.0));
        assert_eq!(
            point["quantileValues"],
            json!([{"quantile": 0.0, "value": 1.0}, {"quantile": 1.0, "value": 4.0}])
        );
    }
}

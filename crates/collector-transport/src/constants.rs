// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector method names and fixed payload literals.

pub const TRANSACTION_SAMPLE_DATA: &str = "transaction_sample_data";
pub const ANALYTIC_EVENT_DATA: &str = "analytic_event_data";
pub const CUSTOM_EVENT_DATA: &str = "custom_event_data";
pub const SPAN_EVENT_DATA: &str = "span_event_data";
pub const METRIC_DATA: &str = "metric_data";
pub const LOG_EVENT_DATA: &str = "log_event_data";
pub const GET_AGENT_COMMANDS: &str = "get_agent_commands";
pub const ERROR_DATA: &str = "error_data";
pub const ERROR_EVENT_DATA: &str = "error_event_data";
pub const SQL_TRACE_DATA: &str = "sql_trace_data";
pub const AGENT_COMMAND_RESULTS: &str = "agent_command_results";
pub const PROFILE_DATA: &str = "profile_data";
pub const UPDATE_LOADED_MODULES: &str = "update_loaded_modules";
pub const SHUTDOWN: &str = "shutdown";

// OTLP protocol methods and their sub-paths
pub const ML_EVENT_DATA: &str = "ml_event_data";
pub const ML_EVENT_PATH: &str = "/v1/logs";
pub const DIMENSIONAL_METRIC_DATA: &str = "dimensional_metric_data";
pub const DIMENSIONAL_METRIC_PATH: &str = "/v1/metrics";

/// Tag the collector expects in front of the loaded module list.
pub const LOADED_MODULES_TAG: &str = "Jars";

/// Span stream auth metadata keys, in the order they are sent.
pub const AGENT_RUN_TOKEN_KEY: &str = "agent_run_token";
pub const LICENSE_KEY_KEY: &str = "license_key";

pub const LABEL_TAG_PREFIX: &str = "tags.";
pub const ML_EVENT_DOMAIN: &str = "newrelic.ml_events";
pub const INSTRUMENTATION_PROVIDER: &str = "collector-transport";

pub const DEFAULT_TRACE_OBSERVER_PORT: u16 = 443;

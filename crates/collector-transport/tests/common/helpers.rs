// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use super::mocks::{MockChannelFactory, MockConnector};
use collector_transport::protocol::ConnectParams;
use collector_transport::streaming::{ChannelSpanSource, MetricRecorderFn, SpanSource};
use collector_transport::{Session, SessionMode, Settings};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const LICENSE_KEY: &str = "0123456789abcdef0123456789abcdef01234567";
pub const TRACE_OBSERVER_HOST: &str = "observer.example.com";

/// Settings under which an application session opens a span stream
pub fn fully_enabled_settings() -> Settings {
    let mut settings = Settings::default();
    settings.license_key = LICENSE_KEY.to_string();
    settings.infinite_tracing.trace_observer_host = TRACE_OBSERVER_HOST.to_string();
    settings.infinite_tracing.trace_observer_port = 8443;
    settings.distributed_tracing.enabled = true;
    settings.span_events.enabled = true;
    settings.collect_span_events = true;
    settings
}

pub fn connect_params(settings: Settings) -> ConnectParams {
    ConnectParams {
        app_name: "checkout-service".to_string(),
        linked_applications: vec![],
        environment: vec![],
        settings: Arc::new(settings),
    }
}

pub async fn connect_session(
    mode: SessionMode,
    settings: Settings,
) -> (Session, MockConnector, MockChannelFactory) {
    let connector = MockConnector::default();
    let channels = MockChannelFactory::default();
    let session = Session::connect(
        mode,
        &connector,
        Arc::new(channels.clone()),
        &connect_params(settings),
    )
    .await
    .expect("session should connect");
    (session, connector, channels)
}

pub fn span_source() -> Arc<dyn SpanSource> {
    let (_tx, rx) = mpsc::channel(16);
    Arc::new(ChannelSpanSource::new(rx))
}

pub fn noop_recorder() -> MetricRecorderFn {
    Arc::new(|_name: &str, _value: f64| {})
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector session.
//!
//! A [`Session`] owns the primary protocol, the OTLP protocol and at most one
//! span stream for a single agent run. It routes each payload type to the
//! right protocol and collector method; it performs no retries and spawns no
//! tasks, so every call maps to exactly one protocol or channel call.
//!
//! # Span stream lifecycle
//!
//! ```text
//!   Absent ──connect_span_stream──> Active ──shutdown_span_stream──> Closed
//!     │ (stays Absent while the observer is unusable; a later call may retry)
//! ```
//!
//! `Closed` is terminal: a session never opens a second channel.
//!
//! # Shutdown order
//!
//! Callers should run `shutdown_span_stream` before `close_connection` so the
//! channel does not outlive the run it authenticates against.

use crate::attribute::{AttributeNormalizer, UserAttributeNormalizer, MAX_NUM_USER_ATTRIBUTES};
use crate::constants::{
    AGENT_COMMAND_RESULTS, AGENT_RUN_TOKEN_KEY, ANALYTIC_EVENT_DATA, CUSTOM_EVENT_DATA,
    DIMENSIONAL_METRIC_DATA, DIMENSIONAL_METRIC_PATH, ERROR_DATA, ERROR_EVENT_DATA,
    GET_AGENT_COMMANDS, LICENSE_KEY_KEY, LOADED_MODULES_TAG, LOG_EVENT_DATA, METRIC_DATA,
    ML_EVENT_DATA, ML_EVENT_PATH, PROFILE_DATA, SHUTDOWN, SPAN_EVENT_DATA, SQL_TRACE_DATA,
    TRANSACTION_SAMPLE_DATA, UPDATE_LOADED_MODULES,
};
use crate::error::{ProtocolError, SessionError};
use crate::log_common::{CommonBlock, LogCommonBlockBuilder};
use crate::mode::SessionMode;
use crate::otlp::{encode_metric_data, encode_ml_event_data};
use crate::payload::{DimensionalMetric, LogRecord, MlEvent, SamplingInfo};
use crate::protocol::{
    AgentCommand, CollectorReply, ConnectParams, Protocol, ProtocolConnector, ProtocolKind,
};
use crate::settings::Settings;
use crate::streaming::{
    MetricRecorderFn, SpanChannelParams, SpanSource, SpanStreamState, StreamingChannel,
    StreamingChannelFactory,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Session {
    mode: SessionMode,
    protocol: Box<dyn Protocol>,
    otlp_protocol: Box<dyn Protocol>,
    channel_factory: Arc<dyn StreamingChannelFactory>,
    span_stream: Option<Arc<dyn StreamingChannel>>,
    span_stream_state: SpanStreamState,
    attribute_normalizer: Arc<dyn AttributeNormalizer>,
    max_custom_attributes: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("agent_run_id", &self.agent_run_id())
            .field("span_stream_state", &self.span_stream_state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect the primary and OTLP protocols with the same application
    /// identity. Failing to connect either one fails the session.
    pub async fn connect(
        mode: SessionMode,
        connector: &dyn ProtocolConnector,
        channel_factory: Arc<dyn StreamingChannelFactory>,
        params: &ConnectParams,
    ) -> Result<Session, SessionError> {
        let primary = mode.primary_protocol();
        let protocol = connector
            .connect(primary, mode, params)
            .await
            .map_err(|source| SessionError::Connect {
                kind: primary,
                source,
            })?;
        let otlp_protocol = connector
            .connect(ProtocolKind::Otlp, mode, params)
            .await
            .map_err(|source| SessionError::Connect {
                kind: ProtocolKind::Otlp,
                source,
            })?;

        let session = Session {
            mode,
            protocol,
            otlp_protocol,
            channel_factory,
            span_stream: None,
            span_stream_state: SpanStreamState::Absent,
            attribute_normalizer: Arc::new(UserAttributeNormalizer),
            max_custom_attributes: MAX_NUM_USER_ATTRIBUTES,
        };
        info!(
            "Connected {} session for {:?} with agent run id {:?}",
            mode,
            params.app_name,
            session.agent_run_id()
        );
        Ok(session)
    }

    /// Replace the normalizer applied to custom log forwarding attributes.
    pub fn set_attribute_normalizer(&mut self, normalizer: Arc<dyn AttributeNormalizer>) {
        self.attribute_normalizer = normalizer;
    }

    pub fn set_max_custom_attributes(&mut self, max: usize) {
        self.max_custom_attributes = max;
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Settings as returned by the primary protocol after connecting.
    pub fn configuration(&self) -> &Settings {
        self.protocol.configuration()
    }

    pub fn agent_run_id(&self) -> Option<&str> {
        self.configuration().agent_run_id.as_deref()
    }

    pub fn span_stream_state(&self) -> SpanStreamState {
        self.span_stream_state
    }

    /// Tear down the primary protocol. The OTLP protocol and the span stream
    /// are left alone.
    pub async fn close_connection(&self) {
        self.protocol.close_connection().await;
    }

    /// Open the span stream if this session has none yet and the settings
    /// enable it. Returns the channel only when this call created it.
    pub async fn connect_span_stream(
        &mut self,
        span_source: Arc<dyn SpanSource>,
        record_metric: MetricRecorderFn,
    ) -> Option<Arc<dyn StreamingChannel>> {
        if !self.mode.allows_span_stream(self.configuration()) {
            debug!("Span stream disabled in {} mode", self.mode);
            return None;
        }
        if self.span_stream_state != SpanStreamState::Absent {
            return None;
        }

        let params = self.span_channel_params()?;
        debug!("Connecting span stream to {}", params.endpoint);

        let channel = self
            .channel_factory
            .create(params, span_source, record_metric);
        channel.connect().await;

        self.span_stream = Some(Arc::clone(&channel));
        self.span_stream_state = SpanStreamState::Active;
        Some(channel)
    }

    fn span_channel_params(&self) -> Option<SpanChannelParams> {
        let config = self.configuration();
        let infinite_tracing = &config.infinite_tracing;

        let Some(host) = infinite_tracing.host() else {
            debug!("No trace observer host configured, span stream not started");
            return None;
        };

        if !(config.distributed_tracing.enabled
            && config.span_events.enabled
            && config.collect_span_events)
        {
            debug!("Span events disabled, span stream not started");
            return None;
        }

        let endpoint = match infinite_tracing.endpoint(host) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!("{e}, span stream not started");
                return None;
            }
        };

        Some(SpanChannelParams {
            endpoint,
            metadata: vec![
                (
                    AGENT_RUN_TOKEN_KEY.to_string(),
                    config.agent_run_id.clone().unwrap_or_default(),
                ),
                (LICENSE_KEY_KEY.to_string(), config.license_key.clone()),
            ],
            ssl: infinite_tracing.ssl,
            compression: infinite_tracing.compression,
        })
    }

    /// Close the span stream if one is active. Once closed, the session never
    /// opens another one.
    pub async fn shutdown_span_stream(&mut self) {
        if self.span_stream_state != SpanStreamState::Active {
            return;
        }
        if let Some(channel) = &self.span_stream {
            channel.close().await;
        }
        self.span_stream_state = SpanStreamState::Closed;
    }

    async fn send<P: Serialize>(
        &self,
        method: &str,
        payload: P,
    ) -> Result<CollectorReply, ProtocolError> {
        let payload = serde_json::to_value(payload)?;
        self.protocol.send(method, payload, None).await
    }

    /// Submit transaction traces. Nothing is sent for an empty collection.
    pub async fn send_transaction_traces<T: Serialize>(
        &self,
        transaction_traces: &[T],
    ) -> Result<CollectorReply, ProtocolError> {
        if transaction_traces.is_empty() {
            return Ok(None);
        }
        self.send(
            TRANSACTION_SAMPLE_DATA,
            (self.agent_run_id(), transaction_traces),
        )
        .await
    }

    pub async fn send_transaction_events<E: Serialize>(
        &self,
        sampling_info: &SamplingInfo,
        sample_set: &[E],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(
            ANALYTIC_EVENT_DATA,
            (self.agent_run_id(), sampling_info, sample_set),
        )
        .await
    }

    pub async fn send_custom_events<E: Serialize>(
        &self,
        sampling_info: &SamplingInfo,
        custom_event_data: &[E],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(
            CUSTOM_EVENT_DATA,
            (self.agent_run_id(), sampling_info, custom_event_data),
        )
        .await
    }

    /// Submit ML events through the OTLP protocol. The OTLP document carries
    /// no reservoir data, so `sampling_info` is not sent.
    pub async fn send_ml_events(
        &self,
        _sampling_info: &SamplingInfo,
        ml_events: &[MlEvent],
    ) -> Result<CollectorReply, ProtocolError> {
        let run_id = self.agent_run_id().unwrap_or_default();
        let payload = encode_ml_event_data(ml_events, run_id);
        self.otlp_protocol
            .send(ML_EVENT_DATA, payload, Some(ML_EVENT_PATH))
            .await
    }

    pub async fn send_span_events<E: Serialize>(
        &self,
        sampling_info: &SamplingInfo,
        span_event_data: &[E],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(
            SPAN_EVENT_DATA,
            (self.agent_run_id(), sampling_info, span_event_data),
        )
        .await
    }

    /// Submit metric data for the period `[start_time, end_time]`, in seconds
    /// since the UNIX epoch.
    pub async fn send_metric_data<M: Serialize>(
        &self,
        start_time: f64,
        end_time: f64,
        metric_data: &[M],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(
            METRIC_DATA,
            (self.agent_run_id(), start_time, end_time, metric_data),
        )
        .await
    }

    /// Dimensional metrics go to the OTLP endpoints so they stay off the
    /// agent's own entity.
    pub async fn send_dimensional_metric_data(
        &self,
        start_time: f64,
        end_time: f64,
        metric_data: &[DimensionalMetric],
    ) -> Result<CollectorReply, ProtocolError> {
        let payload = encode_metric_data(metric_data, start_time, end_time);
        self.otlp_protocol
            .send(DIMENSIONAL_METRIC_DATA, payload, Some(DIMENSIONAL_METRIC_PATH))
            .await
    }

    pub fn get_log_events_common_block(&self) -> CommonBlock {
        LogCommonBlockBuilder::new(self.configuration())
            .with_normalizer(self.attribute_normalizer.as_ref())
            .with_max_custom_attributes(self.max_custom_attributes)
            .build()
    }

    /// Submit log records. A `common.attributes` block is attached only when
    /// it has entries; building it never prevents the records from being sent.
    pub async fn send_log_events(
        &self,
        _sampling_info: &SamplingInfo,
        log_event_data: &[LogRecord],
    ) -> Result<CollectorReply, ProtocolError> {
        let mut batch = Map::new();
        batch.insert("logs".to_string(), serde_json::to_value(log_event_data)?);

        let common = self.get_log_events_common_block();
        if !common.is_empty() {
            let mut block = Map::new();
            block.insert("attributes".to_string(), Value::Object(common));
            batch.insert("common".to_string(), Value::Object(block));
        }

        self.protocol
            .send(LOG_EVENT_DATA, Value::Array(vec![Value::Object(batch)]), None)
            .await
    }

    /// Fetch pending agent commands. Serverless sessions never poll and always
    /// get an empty list.
    pub async fn get_agent_commands(&self) -> Result<Vec<AgentCommand>, ProtocolError> {
        if !self.mode.polls_agent_commands() {
            return Ok(Vec::new());
        }
        let commands = self
            .send(GET_AGENT_COMMANDS, (self.agent_run_id(),))
            .await?;
        Ok(commands.unwrap_or_default())
    }

    pub async fn send_errors<E: Serialize>(
        &self,
        errors: &[E],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(ERROR_DATA, (self.agent_run_id(), errors)).await
    }

    pub async fn send_error_events<E: Serialize>(
        &self,
        sampling_info: &SamplingInfo,
        error_data: &[E],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(
            ERROR_EVENT_DATA,
            (self.agent_run_id(), sampling_info, error_data),
        )
        .await
    }

    /// SQL traces are not scoped to the agent run.
    pub async fn send_sql_traces<S: Serialize>(
        &self,
        sql_traces: &[S],
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(SQL_TRACE_DATA, (sql_traces,)).await
    }

    /// Acknowledge agent commands, `cmd_results` keyed by command id.
    pub async fn send_agent_command_results<R: Serialize>(
        &self,
        cmd_results: &R,
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(AGENT_COMMAND_RESULTS, (self.agent_run_id(), cmd_results))
            .await
    }

    pub async fn send_profile_data<P: Serialize>(
        &self,
        profile_data: &P,
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(PROFILE_DATA, (self.agent_run_id(), profile_data))
            .await
    }

    pub async fn send_loaded_modules<E: Serialize>(
        &self,
        environment_info: &E,
    ) -> Result<CollectorReply, ProtocolError> {
        self.send(UPDATE_LOADED_MODULES, (LOADED_MODULES_TAG, environment_info))
            .await
    }

    /// Deregister the agent run. A no-op for serverless sessions, which have
    /// no persistent run.
    pub async fn shutdown_session(&self) -> Result<CollectorReply, ProtocolError> {
        if !self.mode.deregisters_on_shutdown() {
            return Ok(None);
        }
        self.send(SHUTDOWN, (self.agent_run_id(),)).await
    }

    pub async fn finalize(&self) -> Result<(), ProtocolError> {
        self.protocol.finalize().await
    }
}

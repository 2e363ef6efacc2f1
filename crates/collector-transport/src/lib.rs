// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Collector Transport
//!
//! Session layer between an instrumented process and its telemetry collector.
//!
//! ## Overview
//!
//! A [`Session`] is created once per agent run by a [`SessionFactory`] and
//! drives two protocols plus an optional span stream:
//! - **Primary protocol**: traces, events, metrics, errors, logs, commands
//! - **OTLP protocol**: ML events and dimensional metrics
//! - **Span stream**: long-lived push channel to a trace observer
//!
//! The wire protocols and the span stream transport are supplied by the host
//! through the [`Protocol`], [`ProtocolConnector`] and
//! [`StreamingChannelFactory`] traits.
//!
//! ## Modes
//!
//! [`SessionMode`] is picked from the process-wide [`Settings`]: serverless
//! first, then developer, otherwise application.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod attribute;
pub mod constants;
pub mod error;
pub mod factory;
pub mod log_common;
pub mod mode;
pub mod otlp;
pub mod payload;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod streaming;

pub use error::{ProtocolError, SessionError};
pub use factory::SessionFactory;
pub use mode::SessionMode;
pub use protocol::{AgentCommand, CollectorReply, ConnectParams, Protocol, ProtocolConnector};
pub use session::Session;
pub use settings::{global_settings, set_global_settings, Settings};
pub use streaming::{
    ChannelSpanSource, MetricRecorderFn, SpanSource, SpanStreamState, StreamingChannel,
    StreamingChannelFactory,
};

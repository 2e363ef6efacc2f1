// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::SessionError;
use crate::mode::SessionMode;
use crate::protocol::{ConnectParams, Environment, ProtocolConnector};
use crate::session::Session;
use crate::settings::{global_settings, Settings};
use crate::streaming::StreamingChannelFactory;
use std::sync::Arc;
use tracing::debug;

/// Builds sessions of the mode the process-wide settings ask for.
#[derive(Clone)]
pub struct SessionFactory {
    connector: Arc<dyn ProtocolConnector>,
    channel_factory: Arc<dyn StreamingChannelFactory>,
}

impl SessionFactory {
    pub fn new(
        connector: Arc<dyn ProtocolConnector>,
        channel_factory: Arc<dyn StreamingChannelFactory>,
    ) -> Self {
        SessionFactory {
            connector,
            channel_factory,
        }
    }

    /// Create a session from the current global settings snapshot.
    pub async fn create_session(
        &self,
        license_key: &str,
        app_name: &str,
        linked_applications: &[String],
        environment: Environment,
    ) -> Result<Session, SessionError> {
        self.create_session_with_settings(
            global_settings(),
            license_key,
            app_name,
            linked_applications,
            environment,
        )
        .await
    }

    /// Same as [`SessionFactory::create_session`] with an explicit settings
    /// snapshot. A non-empty `license_key` takes precedence over the snapshot's.
    pub async fn create_session_with_settings(
        &self,
        settings: Arc<Settings>,
        license_key: &str,
        app_name: &str,
        linked_applications: &[String],
        environment: Environment,
    ) -> Result<Session, SessionError> {
        let settings = if license_key.is_empty() || settings.license_key == license_key {
            settings
        } else {
            let mut settings = (*settings).clone();
            settings.license_key = license_key.to_string();
            Arc::new(settings)
        };

        let mode = SessionMode::from_settings(&settings);
        debug!("Creating {mode} session for {app_name:?}");

        let params = ConnectParams {
            app_name: app_name.to_string(),
            linked_applications: linked_applications.to_vec(),
            environment,
            settings,
        };
        Session::connect(
            mode,
            self.connector.as_ref(),
            Arc::clone(&self.channel_factory),
            &params,
        )
        .await
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared attribute block for log payloads.
//!
//! The block is built once per `log_event_data` submission and carries:
//!
//! - configured custom log forwarding attributes, capped in count
//! - application labels as `tags.<type>` entries, when label forwarding is on
//!
//! Building the block is best effort. A fault while building it is logged and
//! yields an empty block so the log records are still delivered.

use crate::attribute::{AttributeNormalizer, UserAttributeNormalizer, MAX_NUM_USER_ATTRIBUTES};
use crate::constants::LABEL_TAG_PREFIX;
use crate::error::CommonBlockError;
use crate::settings::Settings;
use serde_json::{Map, Value};
use tracing::{debug, error};

pub type CommonBlock = Map<String, Value>;

pub struct LogCommonBlockBuilder<'a> {
    settings: &'a Settings,
    normalizer: &'a dyn AttributeNormalizer,
    max_custom_attributes: usize,
}

impl<'a> LogCommonBlockBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        LogCommonBlockBuilder {
            settings,
            normalizer: &UserAttributeNormalizer,
            max_custom_attributes: MAX_NUM_USER_ATTRIBUTES,
        }
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: &'a dyn AttributeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_max_custom_attributes(mut self, max: usize) -> Self {
        self.max_custom_attributes = max;
        self
    }

    /// Build the block, falling back to an empty one on any fault.
    pub fn build(&self) -> CommonBlock {
        match self.try_build() {
            Ok(common) => common,
            Err(e) => {
                error!("Cannot generate common block for log events: {e}");
                CommonBlock::new()
            }
        }
    }

    pub fn try_build(&self) -> Result<CommonBlock, CommonBlockError> {
        let forwarding = &self.settings.application_logging.forwarding;
        let mut common = CommonBlock::new();

        let mut custom_attributes = CommonBlock::new();
        for (name, value) in &forwarding.custom_attributes {
            if custom_attributes.len() >= self.max_custom_attributes {
                debug!(
                    "Maximum number of custom attributes already added. Dropping attribute: {:?}={}",
                    name, value
                );
                break;
            }
            if let Some((key, value)) = self.normalizer.normalize(name, value)? {
                custom_attributes.insert(key, value);
            }
        }
        common.extend(custom_attributes);

        let labels = &self.settings.labels;
        if labels.is_empty() || !forwarding.labels.enabled {
            return Ok(common);
        }

        let exclude: Vec<String> = forwarding
            .labels
            .exclude
            .iter()
            .map(|label_type| label_type.to_lowercase())
            .collect();
        for label in labels {
            if exclude.contains(&label.label_type.to_lowercase()) {
                continue;
            }
            common.insert(
                format!("{LABEL_TAG_PREFIX}{}", label.label_type),
                Value::String(label.label_value.clone()),
            );
        }

        Ok(common)
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::AttributeError;
use serde_json::Value;
use tracing::debug;

/// Default cap on user attributes attached to a single payload.
pub const MAX_NUM_USER_ATTRIBUTES: usize = 128;
/// Upper bound, in bytes, for attribute names and string values.
pub const MAX_ATTRIBUTE_LENGTH: usize = 255;

/// Validates a user supplied attribute.
///
/// `Ok(None)` rejects the attribute; `Err` signals a fault in the normalizer
/// itself.
pub trait AttributeNormalizer: Send + Sync {
    fn normalize(&self, name: &str, value: &Value)
        -> Result<Option<(String, Value)>, AttributeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributeNormalizer;

impl AttributeNormalizer for UserAttributeNormalizer {
    fn normalize(
        &self,
        name: &str,
        value: &Value,
    ) -> Result<Option<(String, Value)>, AttributeError> {
        if name.len() > MAX_ATTRIBUTE_LENGTH {
            debug!(
                "Attribute name exceeds maximum length. Dropping attribute: {:?}",
                name
            );
            return Ok(None);
        }

        let value = match value {
            Value::String(s) => Value::String(truncate(s, MAX_ATTRIBUTE_LENGTH).to_string()),
            Value::Bool(_) | Value::Number(_) => value.clone(),
            _ => {
                debug!(
                    "Attribute value has an invalid type. Dropping attribute: {:?}={}",
                    name, value
                );
                return Ok(None);
            }
        };

        Ok(Some((name.to_string(), value)))
    }
}

/// Cut `s` to at most `max_bytes`, backing off to the nearest char boundary.
pub fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

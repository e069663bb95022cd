//! Frame model and record decoding.
//!
//! A frame is one logical server-pushed message: an optional resumption id,
//! an optional event name, and a JSON payload. On the wire the payload is
//! intentionally double-encoded: the record's `data` field is a JSON string
//! that itself contains JSON, so decoding is a two-stage pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One server-pushed message.
///
/// Only frames with a non-empty `event` are ever stored or dispatched;
/// frames without an `id` never advance the resumption map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Resumption id for this event stream, if the server assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Event name this frame belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Decoded payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Errors from decoding one record into a [`Frame`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The record was not a valid frame envelope.
    #[error("invalid frame envelope: {0}")]
    Envelope(String),
    /// The envelope's `data` string did not contain valid JSON.
    #[error("invalid embedded payload for event {event:?}: {message}")]
    Payload {
        event: Option<String>,
        message: String,
    },
}

impl Frame {
    /// Decode one completed record.
    ///
    /// Stage one parses the envelope; stage two decodes `data` again if it is
    /// a JSON-encoded string. Failure of either stage fails the whole record,
    /// which the connection loop treats as a stream-level error.
    pub fn decode(record: &str) -> Result<Frame, DecodeError> {
        let mut frame: Frame =
            serde_json::from_str(record).map_err(|e| DecodeError::Envelope(e.to_string()))?;

        if let serde_json::Value::String(raw) = &frame.data {
            frame.data = serde_json::from_str(raw).map_err(|e| DecodeError::Payload {
                event: frame.event.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(frame)
    }

    /// The event name, if present and non-empty.
    pub fn event_name(&self) -> Option<&str> {
        self.event.as_deref().filter(|e| !e.is_empty())
    }
}

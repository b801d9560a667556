//! Bus messages and their AMS wire shapes.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BusError, BusResult};

/// A message pulled from a subscription, with its data already decoded.
///
/// A message whose data could not be decoded is still returned, so that it
/// can be acknowledged; `decode_error` is then set and `data` holds the raw
/// wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledMessage {
    /// Handle used to acknowledge the message.
    pub ack_id: String,
    /// Bus-assigned message identifier.
    pub message_id: String,
    /// Message attributes.
    pub attributes: BTreeMap<String, String>,
    /// Decoded payload bytes.
    pub data: Vec<u8>,
    /// Why the wire data could not be decoded.
    pub decode_error: Option<String>,
}

impl PulledMessage {
    /// Creates a message from a raw payload.
    #[must_use]
    pub fn new(ack_id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let ack_id = ack_id.into();
        Self {
            message_id: ack_id.clone(),
            ack_id,
            attributes: BTreeMap::new(),
            data: data.into(),
            decode_error: None,
        }
    }

    /// Creates a message whose wire data could not be decoded.
    #[must_use]
    pub fn undecodable(
        ack_id: impl Into<String>,
        raw: impl Into<Vec<u8>>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            decode_error: Some(reason.into()),
            ..Self::new(ack_id, raw)
        }
    }

    /// Returns whether the wire data was decoded.
    #[must_use]
    pub fn is_decoded(&self) -> bool {
        self.decode_error.is_none()
    }

    /// Parses the payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> BusResult<T> {
        if let Some(ref reason) = self.decode_error {
            return Err(BusError::Decode(format!("invalid base64 message data: {reason}")));
        }
        Ok(serde_json::from_slice(&self.data)?)
    }

    /// Returns the payload as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

// ============================================================================
// AMS wire format
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PullRequest {
    pub max_messages: String,
    pub return_immediately: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PullResponse {
    #[serde(default)]
    pub received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReceivedMessage {
    pub ack_id: String,
    pub message: WireMessage,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AckRequest<'a> {
    pub ack_ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct PublishRequest {
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublishResponse {
    #[serde(default)]
    pub message_ids: Vec<String>,
}

impl ReceivedMessage {
    /// Decodes the message data. Invalid base64 yields an undecodable
    /// message rather than an error, so the rest of the batch is unaffected.
    pub(crate) fn decode(self) -> PulledMessage {
        let (data, decode_error) = match STANDARD.decode(self.message.data.as_bytes()) {
            Ok(data) => (data, None),
            Err(e) => (self.message.data.into_bytes(), Some(e.to_string())),
        };
        PulledMessage {
            message_id: self.message.message_id.unwrap_or_else(|| self.ack_id.clone()),
            ack_id: self.ack_id,
            attributes: self.message.attributes,
            data,
            decode_error,
        }
    }
}

impl WireMessage {
    pub(crate) fn encode(attributes: BTreeMap<String, String>, payload: &[u8]) -> Self {
        Self {
            message_id: None,
            attributes,
            data: STANDARD.encode(payload),
        }
    }
}

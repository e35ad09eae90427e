//! Wire-level identifiers and the internal request envelope.

use uuid::Uuid;

use crate::proto::{CastMessage, CastMessage_PayloadType, CastMessage_ProtocolVersion};

/// The platform endpoint id senders address platform-level requests to.
pub const RECEIVER_ID: &str = "receiver-0";
/// Legacy platform sender id, used only before a per-client id is minted.
pub const PLATFORM_SENDER_ID: &str = "sender-0";
/// The default media receiver app id (`CC1AD845`).
pub const DEFAULT_MEDIA_RECEIVER_APP_ID: &str = "CC1AD845";

/// Mint a per-client sender id of the form `sender-<uuid v4>`, chosen once
/// per `Client` instance and used as `source_id` on every outbound message.
pub fn new_sender_id() -> String {
    format!("sender-{}", Uuid::new_v4())
}

/// Either a JSON payload (the common case) or an opaque binary payload (the
/// auth challenge/response is the only binary message in this protocol).
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Binary(Vec<u8>),
}

/// A fully addressed outbound message, prior to request-id injection and
/// protobuf encoding.
#[derive(Debug, Clone)]
pub struct CastRequest {
    pub id: u32,
    pub namespace: String,
    pub destination_id: String,
    pub payload: Payload,
}

impl CastRequest {
    pub fn json(
        id: u32,
        namespace: impl Into<String>,
        destination_id: impl Into<String>,
        mut payload: serde_json::Value,
    ) -> Self {
        if let serde_json::Value::Object(ref mut map) = payload {
            map.insert("requestId".to_owned(), serde_json::Value::from(id));
        }
        Self {
            id,
            namespace: namespace.into(),
            destination_id: destination_id.into(),
            payload: Payload::Json(payload),
        }
    }

    pub fn binary(
        id: u32,
        namespace: impl Into<String>,
        destination_id: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            destination_id: destination_id.into(),
            payload: Payload::Binary(bytes),
        }
    }

    /// Encode this request into the protobuf wire envelope, addressed from
    /// `source_id`.
    pub fn into_wire_message(self, source_id: &str) -> Result<CastMessage, serde_json::Error> {
        let mut message = CastMessage::new();
        message.set_protocol_version(CastMessage_ProtocolVersion::CASTV2_1_0);
        message.set_source_id(source_id.to_owned());
        message.set_destination_id(self.destination_id);
        message.set_namespace(self.namespace);
        match self.payload {
            Payload::Json(value) => {
                message.set_payload_type(CastMessage_PayloadType::STRING);
                message.set_payload_utf8(serde_json::to_string(&value)?);
            }
            Payload::Binary(bytes) => {
                message.set_payload_type(CastMessage_PayloadType::BINARY);
                message.set_payload_binary(bytes);
            }
        }
        Ok(message)
    }
}

/// Build a bare JSON envelope `{"type": "<TYPE>", ...}` without a request id
/// (used for fire-and-forget messages like `CONNECT`, `CLOSE`, `PING`,
/// `PONG`, which carry no `requestId`).
pub fn envelope(message_type: &str) -> serde_json::Value {
    serde_json::json!({ "type": message_type })
}

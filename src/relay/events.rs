use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rooms::msg::{Message, MessageKind, ReplyTo};

/// Everything a client may send over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Joins the device-scoped channel so pairing success can be pushed to the
    /// code generator. The id is self-asserted; trust comes later, from the
    /// claim presented at joinRoom.
    RegisterDevice { device_id: String },
    JoinRoom {
        room_id: String,
        claim: String,
    },
    SendMessage {
        content: String,
        kind: MessageKind,
        reply_to: Option<ReplyTo>,
        voice_url: Option<String>,
        voice_duration: Option<f64>,
    },
    MessageRead { message_id: String },
    // Call signaling payloads are opaque blobs, relayed verbatim.
    CallOffer { offer: Value },
    CallAnswer { answer: Value },
    IceCandidate { candidate: Value },
    CallEnd,
}

/// Everything the server pushes to a socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Paired { room_id: String, token: String },
    PeerOnline { device_id: String },
    NewMessage(Message),
    MessageRead { message_id: String },
    ChatCleared,
    Unpaired,
    CallOffer { offer: Value, from_device: String },
    CallAnswer { answer: Value },
    IceCandidate { candidate: Value },
    CallEnded,
    PeerOffline { device_id: String },
    Error { reason: String },
    /// Reply to the sendMessage caller only, once persistence has settled.
    Ack {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
}

impl ServerEvent {
    pub fn to_json(&self) -> String {
        // The enum has no non-serializable payloads; failure here would be a bug.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_owned())
    }
}

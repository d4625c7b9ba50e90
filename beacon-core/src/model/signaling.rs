use crate::error::ProtocolError;
use crate::model::blob::SignalBlob;
use crate::model::directory::DirectorySnapshot;
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

/// Routes one answer to the session that advertised `target_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalEnvelope {
    pub target_id: PeerId,
    pub answer: SignalBlob,
}

/// Messages sent by a client over its signalling channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Advertise (or replace) this client's offer in the directory.
    Register {
        id: PeerId,
        alias: String,
        offer: SignalBlob,
    },

    /// Answer to someone else's offer.
    #[serde(rename = "signalling")]
    Signal(SignalEnvelope),

    /// Operator reset of the whole directory.
    ClearRooms,
}

impl ClientMessage {
    /// Parse and validate one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let msg: Self = serde_json::from_str(text)?;
        msg.validate()?;
        Ok(msg)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ClientMessage::Register { id, offer, .. } => {
                if id.is_empty() {
                    return Err(ProtocolError::MissingId);
                }
                if offer.is_empty() {
                    return Err(ProtocolError::MissingOffer);
                }
                Ok(())
            }
            ClientMessage::Signal(envelope) => {
                if envelope.target_id.is_empty() {
                    return Err(ProtocolError::MissingTarget);
                }
                if envelope.answer.is_empty() {
                    return Err(ProtocolError::MissingAnswer);
                }
                Ok(())
            }
            ClientMessage::ClearRooms => Ok(()),
        }
    }
}

/// Messages pushed by the rendezvous server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Complete directory; replaces whatever the client had.
    Clients(DirectorySnapshot),

    /// Answer relayed to the one channel that owns `target_id`.
    #[serde(rename = "signalling")]
    Signal(SignalEnvelope),

    /// The last inbound message was discarded.
    Rejected { reason: String },
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

use thiserror::Error;

/// Reasons a single inbound message is rejected. None of them close the channel.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("register is missing a peer id")]
    MissingId,

    #[error("register is missing an offer")]
    MissingOffer,

    #[error("signalling is missing a target id")]
    MissingTarget,

    #[error("signalling is missing an answer")]
    MissingAnswer,
}

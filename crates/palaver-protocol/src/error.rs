//! Error types for the protocol layer.

use crate::Command;

/// Errors that can occur while encoding or decoding packets.
///
/// The [`Payload`](ProtocolError::Payload) variant is deliberately separate
/// from [`Decode`](ProtocolError::Decode): a packet whose envelope parsed
/// but whose `ExInformation` doesn't match its command tag is a client
/// mistake the dispatcher answers over the wire, while a frame that fails
/// decryption or JSON parsing altogether means the stream is desynced and
/// the connection can't be trusted any further.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a packet into JSON).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization of the packet envelope failed.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The crypto provider could not recover text from the payload bytes.
    #[error("crypto provider failed: {0}")]
    Crypto(String),

    /// The envelope parsed but the `ExInformation` for this command tag is
    /// missing or has the wrong shape.
    #[error("invalid payload for {command}: {detail}")]
    Payload {
        /// The command tag the malformed payload arrived under.
        command: Command,
        /// What was wrong with it.
        detail: String,
    },
}

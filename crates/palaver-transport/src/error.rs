//! Error types for the transport layer.

/// Errors that can occur in the transport layer.
///
/// A transport error only ever affects the one connection that raised it:
/// the dispatcher drops that connection and every other handler keeps
/// running. The exception is [`TransportError::AcceptFailed`] raised while
/// binding, which is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending a frame failed mid-write.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed mid-read (truncated length or payload).
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

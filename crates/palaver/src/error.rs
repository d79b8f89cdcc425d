//! Unified error type for the Palaver server.

use palaver_protocol::ProtocolError;
use palaver_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `palaver` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
///
/// Note the distinction from [`AuthFailure`](palaver_users::AuthFailure):
/// domain failures are answered over the wire and never surface here.
/// `PalaverError` means the server itself hit trouble.
#[derive(Debug, thiserror::Error)]
pub enum PalaverError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, crypto).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Filesystem trouble while reading or writing the settings file or
    /// the user snapshot.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A settings file or user snapshot that exists but doesn't parse.
    #[error("malformed persistence file: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: PalaverError = TransportError::SendFailed(io).into();
        assert!(matches!(err, PalaverError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: PalaverError =
            ProtocolError::Crypto("bad byte".into()).into();
        assert!(matches!(err, PalaverError::Protocol(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io =
            std::io::Error::new(std::io::ErrorKind::NotFound, "no file");
        let err: PalaverError = io.into();
        assert!(matches!(err, PalaverError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err();
        let err: PalaverError = json.into();
        assert!(matches!(err, PalaverError::Json(_)));
    }
}

//! Pluggable payload transforms.
//!
//! Every JSON document passes through the active [`CryptoProvider`] on its
//! way to and from the wire. The two shipped providers are pass-throughs —
//! they provide no confidentiality whatsoever. The abstraction exists so a
//! real cipher can be slotted in later without touching the framing or
//! codec logic.
//!
//! The provider is chosen once at server construction and handed to the
//! [`Wire`](crate::Wire) codec explicitly; there is no process-wide global.

use crate::ProtocolError;

/// A text⇄bytes transform applied to a packet's payload.
///
/// `Send + Sync + 'static` because one provider instance is shared by every
/// connection handler task for the lifetime of the server.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Transforms JSON text into payload bytes.
    fn encrypt(&self, text: &str) -> Vec<u8>;

    /// Recovers JSON text from payload bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Crypto`] when the bytes cannot represent
    /// text under this provider.
    fn decrypt(&self, data: &[u8]) -> Result<String, ProtocolError>;
}

/// Byte-for-byte char cast. Valid only for 7-bit ASCII text.
///
/// Each `char` is truncated to its low byte on encrypt and each byte is
/// widened back on decrypt, so any non-ASCII character is silently
/// corrupted rather than rejected. This matches the deployed wire behavior;
/// use [`Utf8CryptoProvider`] for anything beyond ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiCryptoProvider;

impl CryptoProvider for AsciiCryptoProvider {
    fn encrypt(&self, text: &str) -> Vec<u8> {
        text.chars().map(|c| c as u8).collect()
    }

    fn decrypt(&self, data: &[u8]) -> Result<String, ProtocolError> {
        Ok(data.iter().map(|&b| b as char).collect())
    }
}

/// UTF-8 pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8CryptoProvider;

impl CryptoProvider for Utf8CryptoProvider {
    fn encrypt(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    fn decrypt(&self, data: &[u8]) -> Result<String, ProtocolError> {
        String::from_utf8(data.to_vec())
            .map_err(|e| ProtocolError::Crypto(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_provider_round_trips_ascii_text() {
        let provider = AsciiCryptoProvider;
        let text = r#"{"Command":"Register"}"#;
        let bytes = provider.encrypt(text);
        assert_eq!(provider.decrypt(&bytes).unwrap(), text);
    }

    #[test]
    fn test_ascii_provider_corrupts_non_ascii() {
        // Documented limitation: the char cast truncates anything above
        // 0x7F instead of failing.
        let provider = AsciiCryptoProvider;
        let bytes = provider.encrypt("héllo");
        let back = provider.decrypt(&bytes).unwrap();
        assert_ne!(back, "héllo");
    }

    #[test]
    fn test_utf8_provider_round_trips_non_ascii() {
        let provider = Utf8CryptoProvider;
        let text = "héllo wörld — 你好";
        let bytes = provider.encrypt(text);
        assert_eq!(provider.decrypt(&bytes).unwrap(), text);
    }

    #[test]
    fn test_utf8_provider_rejects_invalid_sequences() {
        let provider = Utf8CryptoProvider;
        let result = provider.decrypt(&[0xff, 0xfe, 0xfd]);
        assert!(matches!(result, Err(ProtocolError::Crypto(_))));
    }
}

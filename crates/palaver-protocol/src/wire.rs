//! The wire codec: packets ⇄ payload bytes.
//!
//! Encoding pipeline, in order:
//!
//! 1. serialize the packet to a JSON document (enum tags as names),
//! 2. push the JSON text through the active [`CryptoProvider`],
//! 3. apply the network byte-order transform to the whole buffer.
//!
//! Decoding runs the same steps in reverse. Framing (the 4-byte length
//! prefix) is the transport crate's job; the bytes produced here are
//! exactly one frame's payload.
//!
//! # The byte-order quirk
//!
//! Step 3 reverses the *entire payload*, not just an integer, whenever the
//! host is little-endian. For a byte string this has no defined benefit and
//! both ends already agree on the length prefix's network order — but the
//! deployed protocol does it, so interoperating means doing it too. Do not
//! "fix" this without coordinating a wire-format version bump with whoever
//! owns client compatibility.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Command, CryptoProvider, ErrorInformation, ProtocolError, RequestPacket,
    RequestPayload, ResponseKind, ResponsePacket, ResponsePayload,
};

/// Applies the host→network transform: the whole buffer is reversed on
/// little-endian hosts and untouched on big-endian ones.
pub fn to_network_order(mut data: Vec<u8>) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        data.reverse();
    }
    data
}

/// Undoes [`to_network_order`]. The transform is its own inverse.
pub fn to_host_order(data: Vec<u8>) -> Vec<u8> {
    to_network_order(data)
}

/// The JSON envelope of a request as it appears on the wire.
#[derive(Serialize, Deserialize)]
struct RawRequest {
    #[serde(rename = "Command")]
    command: Command,
    #[serde(rename = "ExInformation")]
    ex_information: Option<Value>,
}

/// The JSON envelope of a response as it appears on the wire.
#[derive(Serialize, Deserialize)]
struct RawResponse {
    #[serde(rename = "Type")]
    kind: ResponseKind,
    #[serde(rename = "Command")]
    command: Command,
    #[serde(rename = "ErrorInformation")]
    error_information: ErrorInformation,
    #[serde(rename = "ExInformation")]
    ex_information: Option<Value>,
}

/// The codec for one configured crypto provider.
///
/// Cheap to clone; every connection handler holds one.
#[derive(Clone)]
pub struct Wire {
    crypto: Arc<dyn CryptoProvider>,
}

impl Wire {
    /// Creates a codec using the given crypto provider.
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { crypto }
    }

    /// Encodes a request packet into one frame's payload bytes.
    pub fn encode_request(
        &self,
        packet: &RequestPacket,
    ) -> Result<Vec<u8>, ProtocolError> {
        let raw = RawRequest {
            command: packet.command,
            ex_information: packet.payload.to_value()?,
        };
        self.encode_raw(&raw)
    }

    /// Decodes one frame's payload bytes into a request packet.
    ///
    /// # Errors
    /// - [`ProtocolError::Crypto`] / [`ProtocolError::Decode`] when the
    ///   bytes don't decrypt or parse — the stream is desynced.
    /// - [`ProtocolError::Payload`] when the envelope parsed but the
    ///   `ExInformation` doesn't fit the command tag — answerable over the
    ///   wire with `ArgumentInvalid`.
    pub fn decode_request(
        &self,
        data: &[u8],
    ) -> Result<RequestPacket, ProtocolError> {
        let raw: RawRequest = self.decode_raw(data)?;
        let payload =
            RequestPayload::resolve(raw.command, raw.ex_information)?;
        Ok(RequestPacket {
            command: raw.command,
            payload,
        })
    }

    /// Encodes a response packet into one frame's payload bytes.
    ///
    /// The error triple is always written; a response without one is not a
    /// valid packet.
    pub fn encode_response(
        &self,
        packet: &ResponsePacket,
    ) -> Result<Vec<u8>, ProtocolError> {
        let ex_information = match &packet.payload {
            Some(payload) => Some(payload.to_value()?),
            None => None,
        };
        let raw = RawResponse {
            kind: packet.kind,
            command: packet.command,
            error_information: packet.error.clone(),
            ex_information,
        };
        self.encode_raw(&raw)
    }

    /// Decodes one frame's payload bytes into a response packet.
    ///
    /// The typed payload is resolved only when the wire error information
    /// is empty; a failure response's payload is treated as absent even if
    /// bytes are present.
    pub fn decode_response(
        &self,
        data: &[u8],
    ) -> Result<ResponsePacket, ProtocolError> {
        let raw: RawResponse = self.decode_raw(data)?;
        let payload = if raw.error_information.is_empty() {
            ResponsePayload::resolve(raw.command, raw.ex_information)?
        } else {
            None
        };
        Ok(ResponsePacket {
            kind: raw.kind,
            command: raw.command,
            error: raw.error_information,
            payload,
        })
    }

    fn encode_raw<T: Serialize>(
        &self,
        raw: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        let text =
            serde_json::to_string(raw).map_err(ProtocolError::Encode)?;
        Ok(to_network_order(self.crypto.encrypt(&text)))
    }

    fn decode_raw<T: serde::de::DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        let text = self.crypto.decrypt(&to_host_order(data.to_vec()))?;
        serde_json::from_str(&text).map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AsciiCryptoProvider, LoginByUnPwRequest, LoginResponse,
        RegisterRequest, Utf8CryptoProvider,
    };
    use uuid::Uuid;

    fn wires() -> Vec<Wire> {
        vec![
            Wire::new(Arc::new(AsciiCryptoProvider)),
            Wire::new(Arc::new(Utf8CryptoProvider)),
        ]
    }

    // =====================================================================
    // Byte-order transform
    // =====================================================================

    #[test]
    fn test_network_order_transform_is_its_own_inverse() {
        let data = vec![1, 2, 3, 4, 5];
        assert_eq!(to_host_order(to_network_order(data.clone())), data);
    }

    #[test]
    fn test_network_order_reverses_on_little_endian_hosts() {
        let transformed = to_network_order(vec![1, 2, 3]);
        if cfg!(target_endian = "little") {
            assert_eq!(transformed, vec![3, 2, 1]);
        } else {
            assert_eq!(transformed, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_encoded_payload_is_byte_order_transformed_json() {
        // With the UTF-8 pass-through provider the payload must be exactly
        // the JSON text after the whole-buffer transform.
        let wire = Wire::new(Arc::new(Utf8CryptoProvider));
        let packet = RequestPacket {
            command: Command::LoginBySession,
            payload: RequestPayload::LoginBySession(
                crate::LoginBySessionRequest {
                    session: "a1b2c3d4e5f6a7b8".into(),
                },
            ),
        };
        let bytes = wire.encode_request(&packet).unwrap();

        let json_text = String::from_utf8(to_host_order(bytes)).unwrap();
        let value: Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(value["Command"], "LoginBySession");
        assert_eq!(value["ExInformation"]["Session"], "a1b2c3d4e5f6a7b8");
    }

    // =====================================================================
    // Request round trips
    // =====================================================================

    #[test]
    fn test_register_request_round_trips_with_every_provider() {
        let packet = RequestPacket {
            command: Command::Register,
            payload: RequestPayload::Register(RegisterRequest {
                username: "alice".into(),
                password: "pw1".into(),
                nickname: "Alice".into(),
            }),
        };
        for wire in wires() {
            let bytes = wire.encode_request(&packet).unwrap();
            let decoded = wire.decode_request(&bytes).unwrap();
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn test_login_request_round_trips_with_every_provider() {
        let packet = RequestPacket {
            command: Command::LoginByUnPw,
            payload: RequestPayload::LoginByUnPw(LoginByUnPwRequest {
                username: "alice".into(),
                password: "pw1".into(),
            }),
        };
        for wire in wires() {
            let bytes = wire.encode_request(&packet).unwrap();
            assert_eq!(wire.decode_request(&bytes).unwrap(), packet);
        }
    }

    #[test]
    fn test_unsupported_request_round_trips_with_absent_payload() {
        let packet = RequestPacket {
            command: Command::SendPlainMessage,
            payload: RequestPayload::Unsupported,
        };
        for wire in wires() {
            let bytes = wire.encode_request(&packet).unwrap();
            let decoded = wire.decode_request(&bytes).unwrap();
            assert_eq!(decoded.command, Command::SendPlainMessage);
            assert_eq!(decoded.payload, RequestPayload::Unsupported);
        }
    }

    #[test]
    fn test_decode_request_with_bad_payload_reports_payload_error() {
        let wire = Wire::new(Arc::new(Utf8CryptoProvider));
        let text = r#"{"Command":"Register","ExInformation":{"Nope":1}}"#;
        let bytes =
            to_network_order(Utf8CryptoProvider.encrypt(text));
        let result = wire.decode_request(&bytes);
        assert!(matches!(
            result,
            Err(ProtocolError::Payload {
                command: Command::Register,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_request_garbage_reports_decode_error() {
        let wire = Wire::new(Arc::new(Utf8CryptoProvider));
        let bytes = to_network_order(b"not json at all".to_vec());
        let result = wire.decode_request(&bytes);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    // =====================================================================
    // Response round trips
    // =====================================================================

    #[test]
    fn test_success_response_round_trips_with_every_provider() {
        let packet = ResponsePacket::success(
            Command::LoginBySession,
            ResponsePayload::Login(LoginResponse {
                login_session: "a1b2c3d4e5f6a7b8".into(),
                user_guid: Uuid::new_v4(),
            }),
        );
        for wire in wires() {
            let bytes = wire.encode_response(&packet).unwrap();
            assert_eq!(wire.decode_response(&bytes).unwrap(), packet);
        }
    }

    #[test]
    fn test_failure_response_round_trips_without_payload() {
        let packet = ResponsePacket::failure(
            Command::Register,
            ErrorInformation {
                error_message: "UserAlreadyExists: taken".into(),
                error_code: 101,
                advice: "pick another".into(),
            },
        );
        for wire in wires() {
            let bytes = wire.encode_response(&packet).unwrap();
            let decoded = wire.decode_response(&bytes).unwrap();
            assert_eq!(decoded, packet);
            assert_eq!(decoded.payload, None);
        }
    }

    #[test]
    fn test_failure_response_ignores_payload_bytes_even_if_present() {
        // A failure response that (incorrectly) carries an ExInformation
        // must still decode with an absent payload.
        let wire = Wire::new(Arc::new(Utf8CryptoProvider));
        let text = r#"{
            "Type": "Failure",
            "Command": "Register",
            "ErrorInformation": {
                "ErrorMessage": "boom", "ErrorCode": 101, "Advice": ""
            },
            "ExInformation": {"LoginSession": "x", "WarningSamePassword": false}
        }"#;
        let bytes = to_network_order(Utf8CryptoProvider.encrypt(text));
        let decoded = wire.decode_response(&bytes).unwrap();
        assert_eq!(decoded.payload, None);
        assert_eq!(decoded.error.error_code, 101);
    }

    #[test]
    fn test_response_wire_json_has_expected_field_names() {
        let wire = Wire::new(Arc::new(Utf8CryptoProvider));
        let packet = ResponsePacket::success(
            Command::Register,
            ResponsePayload::Register(crate::RegisterResponse {
                login_session: "a1b2c3d4e5f6a7b8".into(),
                warning_same_password: true,
                user_guid: Uuid::new_v4(),
            }),
        );
        let bytes = wire.encode_response(&packet).unwrap();
        let text = String::from_utf8(to_host_order(bytes)).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["Type"], "Success");
        assert_eq!(value["Command"], "Register");
        assert_eq!(value["ErrorInformation"]["ErrorCode"], 0);
        assert_eq!(value["ExInformation"]["WarningSamePassword"], true);
    }
}

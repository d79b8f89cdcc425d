//! Core packet types for Palaver's wire format.
//!
//! Everything in this module is a structure that gets serialized to JSON,
//! pushed through a crypto provider, and sent over a TCP frame. Field names
//! and enum spellings are load-bearing: existing clients parse exactly
//! these shapes, so every struct pins its JSON names with serde attributes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Every command tag in the protocol, wire-encoded as its symbolic name.
///
/// Only `Register`, `LoginByUnPw`, and `LoginBySession` have handlers in
/// this server. The rest are declared so their packets still parse; the
/// dispatcher answers them through the `ArgumentInvalid` reject path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Command {
    Register,
    LoginByUnPw,
    LoginBySession,
    ChangePassword,
    UserSetting,
    GetUserInformation,
    SwitchSendMethod,
    SendPlainMessage,
    SendMarkdownMessage,
    SendPictureMessage,
    SendFileMessage,
    ReplyMessage,
    GlobalPost,
    PostAllOnlineUsers,
    ClickUser,
    Unregister,
}

impl Command {
    /// The wire spelling of this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Register => "Register",
            Command::LoginByUnPw => "LoginByUnPw",
            Command::LoginBySession => "LoginBySession",
            Command::ChangePassword => "ChangePassword",
            Command::UserSetting => "UserSetting",
            Command::GetUserInformation => "GetUserInformation",
            Command::SwitchSendMethod => "SwitchSendMethod",
            Command::SendPlainMessage => "SendPlainMessage",
            Command::SendMarkdownMessage => "SendMarkdownMessage",
            Command::SendPictureMessage => "SendPictureMessage",
            Command::SendFileMessage => "SendFileMessage",
            Command::ReplyMessage => "ReplyMessage",
            Command::GlobalPost => "GlobalPost",
            Command::PostAllOnlineUsers => "PostAllOnlineUsers",
            Command::ClickUser => "ClickUser",
            Command::Unregister => "Unregister",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResponseKind
// ---------------------------------------------------------------------------

/// The `Type` field of a response packet.
///
/// The message-push kinds are declared for wire compatibility; this server
/// only ever emits `Success` and `Failure`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum ResponseKind {
    Success,
    Failure,
    NeedSetOptions,
    PlainMessage,
    MarkdownMessage,
    PictureMessage,
    FileMessage,
    ReplyMessage,
    GlobalPostMessage,
    ClickUserMessage,
    PostAllOnlineUsersMessage,
}

// ---------------------------------------------------------------------------
// ErrorInformation
// ---------------------------------------------------------------------------

/// The error triple carried by every response packet.
///
/// A successful response carries the well-known [`empty`](Self::empty)
/// value, never an absent field — clients decide whether to parse the
/// typed payload by comparing against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInformation {
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: i32,
    #[serde(rename = "Advice")]
    pub advice: String,
}

impl ErrorInformation {
    /// The "no error" value: code 0, empty strings.
    pub fn empty() -> Self {
        Self {
            error_message: String::new(),
            error_code: 0,
            advice: String::new(),
        }
    }

    /// Whether this is the "no error" value.
    pub fn is_empty(&self) -> bool {
        self.error_code == 0
            && self.error_message.is_empty()
            && self.advice.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// `ExInformation` for [`Command::Register`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub nickname: String,
}

/// `ExInformation` for [`Command::LoginByUnPw`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginByUnPwRequest {
    pub username: String,
    pub password: String,
}

/// `ExInformation` for [`Command::LoginBySession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginBySessionRequest {
    pub session: String,
}

/// The typed request payload, resolved from the command tag.
///
/// This is the tag→type table as a sum type: one variant per command this
/// server handles, plus an explicit [`Unsupported`](Self::Unsupported)
/// variant for every declared tag without a handler. An unsupported tag is
/// data, not an error — the dispatcher turns it into an `ArgumentInvalid`
/// response and keeps the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    Register(RegisterRequest),
    LoginByUnPw(LoginByUnPwRequest),
    LoginBySession(LoginBySessionRequest),
    Unsupported,
}

impl RequestPayload {
    /// Resolves the raw `ExInformation` value against the command tag.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Payload`] when the tag is one this server
    /// handles but the value is missing or the wrong shape.
    pub fn resolve(
        command: Command,
        ex_information: Option<Value>,
    ) -> Result<Self, ProtocolError> {
        fn parse<T: serde::de::DeserializeOwned>(
            command: Command,
            value: Option<Value>,
        ) -> Result<T, ProtocolError> {
            let value = value.ok_or_else(|| ProtocolError::Payload {
                command,
                detail: "ExInformation is missing".to_string(),
            })?;
            serde_json::from_value(value).map_err(|e| {
                ProtocolError::Payload {
                    command,
                    detail: e.to_string(),
                }
            })
        }

        match command {
            Command::Register => {
                Ok(Self::Register(parse(command, ex_information)?))
            }
            Command::LoginByUnPw => {
                Ok(Self::LoginByUnPw(parse(command, ex_information)?))
            }
            Command::LoginBySession => {
                Ok(Self::LoginBySession(parse(command, ex_information)?))
            }
            _ => Ok(Self::Unsupported),
        }
    }

    /// Serializes the payload back to a raw `ExInformation` value.
    pub fn to_value(&self) -> Result<Option<Value>, ProtocolError> {
        match self {
            Self::Register(p) => {
                serde_json::to_value(p).map(Some).map_err(ProtocolError::Encode)
            }
            Self::LoginByUnPw(p) => {
                serde_json::to_value(p).map(Some).map_err(ProtocolError::Encode)
            }
            Self::LoginBySession(p) => {
                serde_json::to_value(p).map(Some).map_err(ProtocolError::Encode)
            }
            Self::Unsupported => Ok(None),
        }
    }
}

/// One decoded request: the command tag plus its resolved payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPacket {
    pub command: Command,
    pub payload: RequestPayload,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Success `ExInformation` for [`Command::Register`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterResponse {
    pub login_session: String,
    pub warning_same_password: bool,
    pub user_guid: Uuid,
}

/// Success `ExInformation` for both login commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResponse {
    pub login_session: String,
    pub user_guid: Uuid,
}

/// The typed response payload, resolved from the echoed command tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Register(RegisterResponse),
    Login(LoginResponse),
}

impl ResponsePayload {
    /// Resolves a response `ExInformation` against the echoed command tag.
    ///
    /// Only called for responses whose error information is empty; commands
    /// without a defined response payload resolve to `None` even when bytes
    /// are present.
    pub fn resolve(
        command: Command,
        ex_information: Option<Value>,
    ) -> Result<Option<Self>, ProtocolError> {
        let Some(value) = ex_information else {
            return Ok(None);
        };
        match command {
            Command::Register => serde_json::from_value(value)
                .map(|p| Some(Self::Register(p)))
                .map_err(|e| ProtocolError::Payload {
                    command,
                    detail: e.to_string(),
                }),
            Command::LoginByUnPw | Command::LoginBySession => {
                serde_json::from_value(value)
                    .map(|p| Some(Self::Login(p)))
                    .map_err(|e| ProtocolError::Payload {
                        command,
                        detail: e.to_string(),
                    })
            }
            _ => Ok(None),
        }
    }

    /// Serializes the payload back to a raw `ExInformation` value.
    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        match self {
            Self::Register(p) => {
                serde_json::to_value(p).map_err(ProtocolError::Encode)
            }
            Self::Login(p) => {
                serde_json::to_value(p).map_err(ProtocolError::Encode)
            }
        }
    }
}

/// One response: kind, echoed command, error triple, optional payload.
///
/// `error` is never omitted on the wire; it is the empty value on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePacket {
    pub kind: ResponseKind,
    pub command: Command,
    pub error: ErrorInformation,
    pub payload: Option<ResponsePayload>,
}

impl ResponsePacket {
    /// Builds a success response with the given payload.
    pub fn success(command: Command, payload: ResponsePayload) -> Self {
        Self {
            kind: ResponseKind::Success,
            command,
            error: ErrorInformation::empty(),
            payload: Some(payload),
        }
    }

    /// Builds a failure response carrying the given error triple.
    pub fn failure(command: Command, error: ErrorInformation) -> Self {
        Self {
            kind: ResponseKind::Failure,
            command,
            error,
            payload: None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

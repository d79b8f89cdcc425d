//! The error taxonomy: every domain failure the auth core can answer.
//!
//! Each kind carries a stable numeric code, a canonical message, and a
//! remediation advice string, plus converters to and from the wire
//! [`ErrorInformation`] triple. The table is static and closed — new kinds
//! mean a protocol change, not a new enum variant on a whim.
//!
//! One historical ambiguity is resolved here: an earlier deployment
//! assigned 103 to both the malformed-argument kind and (nominally) the
//! session kind, while actually emitting 111 for the latter — colliding
//! with unknown-user. This table gives `SessionInvalid` the previously
//! unused 104 so every code maps back to exactly one kind.

use palaver_protocol::ErrorInformation;

/// The separator joining message and advice in the packed single-string
/// form. Reserved: no dynamic message may contain it, or
/// [`split_packed`] cannot reconstruct the pair.
pub const ADVICE_SEPARATOR: &str = " Advice: ";

/// Splits a packed `"message Advice: advice"` string back into its parts.
///
/// Returns `None` when the separator is absent.
pub fn split_packed(packed: &str) -> Option<(&str, &str)> {
    packed.split_once(ADVICE_SEPARATOR)
}

/// A domain failure, as surfaced to clients.
///
/// These are expected and recoverable: the dispatcher turns them into
/// `Failure` responses and the connection stays open. They never terminate
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// Register with a username that is already taken.
    #[error("UserAlreadyExists: Request username found in user list. Advice: Try other username to be success.")]
    UserAlreadyExists,

    /// Login with a password whose hash doesn't match the account's.
    #[error("PasswordWrong: Password of request is wrong of target user. Advice: Try other password.")]
    PasswordWrong,

    /// Unrecognized or malformed command.
    #[error("ArgumentInvalid: Argument(s) of request is wrong. Advice: Please correct your argument.")]
    ArgumentInvalid,

    /// Session login with a token no account currently holds, or one past
    /// its expiry.
    #[error("SessionInvalid: Login session not found in session list or no usable. Advice: Use username and password to login.")]
    SessionInvalid,

    /// Lookup or login with a username or account id that doesn't exist.
    #[error("UserNotFound: Request username not found in user list. Advice: Try other username to be success.")]
    UserNotFound,
}

impl AuthFailure {
    /// The stable wire code for this kind.
    pub fn code(&self) -> i32 {
        match self {
            Self::UserAlreadyExists => 101,
            Self::PasswordWrong => 102,
            Self::ArgumentInvalid => 103,
            Self::SessionInvalid => 104,
            Self::UserNotFound => 111,
        }
    }

    /// The canonical message for this kind.
    pub fn message(&self) -> &'static str {
        match self {
            Self::UserAlreadyExists => {
                "UserAlreadyExists: Request username found in user list."
            }
            Self::PasswordWrong => {
                "PasswordWrong: Password of request is wrong of target user."
            }
            Self::ArgumentInvalid => {
                "ArgumentInvalid: Argument(s) of request is wrong."
            }
            Self::SessionInvalid => {
                "SessionInvalid: Login session not found in session list or no usable."
            }
            Self::UserNotFound => {
                "UserNotFound: Request username not found in user list."
            }
        }
    }

    /// The remediation advice for this kind.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::UserAlreadyExists | Self::UserNotFound => {
                "Try other username to be success."
            }
            Self::PasswordWrong => "Try other password.",
            Self::ArgumentInvalid => "Please correct your argument.",
            Self::SessionInvalid => "Use username and password to login.",
        }
    }

    /// Converts this kind to the wire triple.
    pub fn to_error_information(&self) -> ErrorInformation {
        ErrorInformation {
            error_message: self.message().to_string(),
            error_code: self.code(),
            advice: self.advice().to_string(),
        }
    }

    /// Resolves a wire triple back to a kind, by code.
    ///
    /// Returns `None` for code 0 (no error) and for any code outside the
    /// table.
    pub fn from_error_information(info: &ErrorInformation) -> Option<Self> {
        match info.error_code {
            101 => Some(Self::UserAlreadyExists),
            102 => Some(Self::PasswordWrong),
            103 => Some(Self::ArgumentInvalid),
            104 => Some(Self::SessionInvalid),
            111 => Some(Self::UserNotFound),
            _ => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

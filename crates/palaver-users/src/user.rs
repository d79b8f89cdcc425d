//! The account data model: users, sessions, and the per-user log.
//!
//! Serde names on these types are pinned to the snapshot format — the
//! persistence collaborator writes the whole account list as JSON and reads
//! it back at the next startup, so renaming a field here is a data
//! migration, not a refactor.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of a session token, in characters.
pub const SESSION_TOKEN_LEN: usize = 16;

/// How long a freshly issued session stays usable.
const SESSION_VALID_DAYS: i64 = 30;

/// Hashes a raw password into its stored form: base64 of the SHA-256
/// digest. All password comparisons happen on this encoded text.
pub fn hash_password(raw: &str) -> String {
    BASE64.encode(Sha256::digest(raw.as_bytes()))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A login session: an opaque token with a 30-day validity window.
///
/// At most one session is active per account. Issuing a new one overwrites
/// the stored value, which is the entire revocation mechanism — the old
/// token simply stops matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "RawString")]
    raw: String,
    #[serde(rename = "GenerationTime")]
    generation_time: DateTime<Utc>,
    #[serde(rename = "UsableLeastTime")]
    usable_least_time: DateTime<Utc>,
}

impl Session {
    /// Issues a fresh session: 16 random alphanumeric characters, usable
    /// for the next 30 days.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let raw = (0..SESSION_TOKEN_LEN)
            .map(|_| rng.sample(Alphanumeric) as char)
            .collect();
        let now = Utc::now();
        Self {
            raw,
            generation_time: now,
            usable_least_time: now + Duration::days(SESSION_VALID_DAYS),
        }
    }

    /// Builds a session from explicit parts. Used by tests to construct
    /// expired or superseded tokens.
    pub fn from_parts(
        raw: String,
        generation_time: DateTime<Utc>,
        usable_least_time: DateTime<Utc>,
    ) -> Self {
        Self {
            raw,
            generation_time,
            usable_least_time,
        }
    }

    /// The token text presented by clients.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// When this session was issued.
    pub fn generation_time(&self) -> DateTime<Utc> {
        self.generation_time
    }

    /// Whether the validity window is still open.
    pub fn is_usable(&self) -> bool {
        Utc::now() < self.usable_least_time
    }
}

// ---------------------------------------------------------------------------
// User log
// ---------------------------------------------------------------------------

/// What kind of event a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserLogKind {
    Register,
    Login,
}

/// One entry in a user's append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLogEntry {
    #[serde(rename = "RecordTime")]
    pub record_time: DateTime<Utc>,
    #[serde(rename = "Type")]
    pub kind: UserLogKind,
    #[serde(rename = "Message")]
    pub message: String,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// One account in the registry.
///
/// `username` and `user_guid` are immutable after creation. Everything else
/// mutates only through [`UserStore`](crate::UserStore) — connection
/// handlers never hold a `&mut User` into shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Nickname")]
    pub nickname: String,
    #[serde(rename = "PasswordSHA256")]
    pub password_sha256: String,
    #[serde(rename = "UserGuid")]
    pub user_guid: Uuid,
    #[serde(rename = "Session")]
    pub session: Session,
    #[serde(rename = "LastLoginTime")]
    pub last_login_time: DateTime<Utc>,
    #[serde(rename = "RegisterTime")]
    pub register_time: DateTime<Utc>,
    #[serde(rename = "UserLog")]
    pub user_log: Vec<UserLogEntry>,
    #[serde(rename = "OtherInformation")]
    pub other_information: HashMap<String, String>,
}

impl User {
    /// Creates a brand-new account with a fresh session and empty log.
    pub fn new(
        username: impl Into<String>,
        nickname: impl Into<String>,
        password_sha256: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            nickname: nickname.into(),
            password_sha256: password_sha256.into(),
            user_guid: Uuid::new_v4(),
            session: Session::generate(),
            last_login_time: now,
            register_time: now,
            user_log: Vec::new(),
            other_information: HashMap::new(),
        }
    }

    /// Appends an entry to this user's event log.
    pub fn log(&mut self, kind: UserLogKind, message: impl Into<String>) {
        self.user_log.push(UserLogEntry {
            record_time: Utc::now(),
            kind,
            message: message.into(),
        });
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_base64_of_sha256() {
        // SHA-256 of "pw1", base64-encoded: 44 chars ending in '='.
        let hash = hash_password("pw1");
        assert_eq!(hash.len(), 44);
        assert!(hash.ends_with('='));
        // Deterministic.
        assert_eq!(hash, hash_password("pw1"));
        assert_ne!(hash, hash_password("pw2"));
    }

    #[test]
    fn test_generate_session_is_16_alphanumeric_chars() {
        let session = Session::generate();
        assert_eq!(session.raw().len(), SESSION_TOKEN_LEN);
        assert!(session.raw().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_session_is_usable_for_30_days() {
        let session = Session::generate();
        assert!(session.is_usable());
        let window = session.usable_least_time - session.generation_time;
        assert_eq!(window, Duration::days(30));
    }

    #[test]
    fn test_session_tokens_are_distinct() {
        assert_ne!(Session::generate().raw(), Session::generate().raw());
    }

    #[test]
    fn test_expired_session_is_not_usable() {
        let session = Session::from_parts(
            "a1b2c3d4e5f6a7b8".into(),
            Utc::now() - Duration::days(40),
            Utc::now() - Duration::days(10),
        );
        assert!(!session.is_usable());
    }

    #[test]
    fn test_new_user_starts_with_empty_log_and_fresh_session() {
        let user = User::new("alice", "Alice", hash_password("pw1"));
        assert!(user.user_log.is_empty());
        assert!(user.other_information.is_empty());
        assert!(user.session.is_usable());
        assert_eq!(user.register_time, user.last_login_time);
    }

    #[test]
    fn test_log_appends_in_order() {
        let mut user = User::new("alice", "Alice", hash_password("pw1"));
        user.log(UserLogKind::Register, "Register success.");
        user.log(UserLogKind::Login, "Login success.");
        assert_eq!(user.user_log.len(), 2);
        assert_eq!(user.user_log[0].kind, UserLogKind::Register);
        assert_eq!(user.user_log[1].message, "Login success.");
    }

    #[test]
    fn test_user_snapshot_json_field_names() {
        // The snapshot format is load-bearing; these names must not drift.
        let user = User::new("alice", "Alice", hash_password("pw1"));
        let value = serde_json::to_value(&user).unwrap();
        for key in [
            "Username",
            "Nickname",
            "PasswordSHA256",
            "UserGuid",
            "Session",
            "LastLoginTime",
            "RegisterTime",
            "UserLog",
            "OtherInformation",
        ] {
            assert!(value.get(key).is_some(), "missing snapshot key {key}");
        }
        assert!(value["Session"].get("RawString").is_some());
        assert!(value["Session"].get("UsableLeastTime").is_some());
    }

    #[test]
    fn test_user_round_trips_through_snapshot_json() {
        let mut user = User::new("alice", "Alice", hash_password("pw1"));
        user.log(UserLogKind::Register, "Register success.");
        user.other_information
            .insert("theme".to_string(), "dark".to_string());

        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}

//! The register/login flows and the two-phase login confirmer.
//!
//! A login lookup can succeed while the response send still fails (the
//! peer can vanish mid-write). To keep the client and the store in
//! agreement, a successful lookup returns a [`LoginConfirmer`] holding the
//! replacement session *tentatively*: the dispatcher sends the success
//! response carrying the pending token first, then calls
//! [`confirm`](LoginConfirmer::confirm) — only that call rotates the stored
//! session. If the send fails, [`cancel`](LoginConfirmer::cancel) discards
//! the rotation and the old token stays valid. A client therefore never
//! ends up locked out by a rotation it was never told about.
//!
//! Registration has no such window: the account is created before the
//! response goes out, and a failed send leaves it registered.

use chrono::Utc;

use crate::error::AuthFailure;
use crate::store::UserStore;
use crate::user::{Session, User, UserLogKind, hash_password};

/// Registers a new account.
///
/// Returns the created user plus the duplicate-password warning flag: when
/// the new password's hash collides with any existing account's hash the
/// registration still succeeds, but the caller surfaces the warning in the
/// response payload.
///
/// # Errors
/// [`AuthFailure::UserAlreadyExists`] when the username is taken.
pub fn register(
    store: &mut UserStore,
    username: &str,
    password: &str,
    nickname: &str,
) -> Result<(User, bool), AuthFailure> {
    if store.find_by_username(username).is_some() {
        tracing::error!(username, "register rejected, username taken");
        return Err(AuthFailure::UserAlreadyExists);
    }

    let password_sha256 = hash_password(password);
    let same_password = store.any_password_hash(&password_sha256);
    if same_password {
        tracing::warn!(
            username,
            hash_prefix = &password_sha256[..8],
            "another account already uses this password hash"
        );
    }

    let mut user = User::new(username, nickname, password_sha256);
    user.log(UserLogKind::Register, "Register success.");
    store.insert(user.clone());

    tracing::info!(
        username,
        nickname,
        user_guid = %user.user_guid,
        "registered new account"
    );

    Ok((user, same_password))
}

/// Looks up an account by username and password hash.
///
/// Does not mutate the store; the rotation is deferred to the returned
/// confirmer.
///
/// # Errors
/// - [`AuthFailure::UserNotFound`] when no account has that username.
/// - [`AuthFailure::PasswordWrong`] when the hash doesn't match.
pub fn login_by_password(
    store: &UserStore,
    username: &str,
    password: &str,
) -> Result<LoginConfirmer, AuthFailure> {
    let Some(user) = store.find_by_username(username) else {
        tracing::error!(username, "login rejected, unknown username");
        return Err(AuthFailure::UserNotFound);
    };

    if user.password_sha256 != hash_password(password) {
        tracing::error!(username, "login rejected, password mismatch");
        return Err(AuthFailure::PasswordWrong);
    }

    tracing::info!(
        username,
        user_guid = %user.user_guid,
        "password login tentatively accepted"
    );
    Ok(LoginConfirmer::new(user.clone()))
}

/// Looks up an account by its current session token.
///
/// # Errors
/// [`AuthFailure::SessionInvalid`] when no account holds the exact token
/// or the token's validity window has closed. A superseded token fails
/// here too: rotation overwrote the stored value, so nothing matches.
pub fn login_by_session(
    store: &UserStore,
    token: &str,
) -> Result<LoginConfirmer, AuthFailure> {
    let Some(user) = store.find_by_session(token) else {
        tracing::error!("session login rejected, token not held");
        return Err(AuthFailure::SessionInvalid);
    };

    if !user.session.is_usable() {
        tracing::error!(
            username = user.username,
            "session login rejected, token expired"
        );
        return Err(AuthFailure::SessionInvalid);
    }

    tracing::info!(
        username = user.username,
        user_guid = %user.user_guid,
        "session login tentatively accepted"
    );
    Ok(LoginConfirmer::new(user.clone()))
}

/// The transaction handle for one login: commit the session rotation with
/// [`confirm`](Self::confirm), or discard it with [`cancel`](Self::cancel).
///
/// The replacement session is generated at construction so the caller can
/// put the token a confirmed login *will* have into the response before
/// committing. Exactly one of confirm/cancel takes effect; whichever runs
/// second (or again) is a no-op. Lives only for the handling of one
/// request — never stored, never persisted.
#[derive(Debug)]
pub struct LoginConfirmer {
    user: User,
    pending: Session,
    operated: bool,
}

impl LoginConfirmer {
    fn new(user: User) -> Self {
        Self {
            user,
            pending: Session::generate(),
            operated: false,
        }
    }

    /// The matched account as of the lookup.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The session that will be installed by [`confirm`](Self::confirm).
    pub fn pending_session(&self) -> &Session {
        &self.pending
    }

    /// Commits the login: installs the pending session, stamps last-login,
    /// appends the refresh/success log entries, and writes the record back
    /// into the store.
    ///
    /// Takes `&mut UserStore` so the caller must hold the store lock; the
    /// rewrite re-reads the current record rather than writing back the
    /// lookup-time copy, so log entries appended in between survive.
    /// Idempotent: a second call returns the already-committed user.
    pub fn confirm(&mut self, store: &mut UserStore) -> &User {
        if self.operated {
            return &self.user;
        }

        let mut current = store
            .find_by_guid(self.user.user_guid)
            .expect("confirmer target must exist in the store")
            .clone();
        current.session = self.pending.clone();
        current.last_login_time = Utc::now();
        current.log(UserLogKind::Login, "Login session refreshed.");
        current.log(UserLogKind::Login, "Login success.");
        store.replace(current.clone());

        tracing::info!(
            username = current.username,
            user_guid = %current.user_guid,
            "login session refreshed"
        );
        tracing::info!(
            username = current.username,
            user_guid = %current.user_guid,
            "login success"
        );

        self.user = current;
        self.operated = true;
        &self.user
    }

    /// Discards the login: notes the failure on the local copy only and
    /// leaves the store untouched. Idempotent.
    pub fn cancel(&mut self) {
        if self.operated {
            return;
        }
        tracing::info!(
            username = self.user.username,
            user_guid = %self.user.user_guid,
            "login failed"
        );
        self.user.log(UserLogKind::Login, "Login failed.");
        self.operated = true;
    }
}

// =========================================================================
// Tests
// =========================================================================

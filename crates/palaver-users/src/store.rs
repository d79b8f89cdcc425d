//! The in-memory user registry.
//!
//! `UserStore` is deliberately not thread-safe on its own: the server owns
//! one instance behind a `tokio::sync::Mutex`, and the auth flows take the
//! store by `&`/`&mut` so every uniqueness check and every write happens
//! under the caller's single lock acquisition. Keeping the locking out of
//! this type means no hidden double-locking and no window between "checked"
//! and "changed".

use uuid::Uuid;

use crate::user::{User, UserLogKind};

/// The account registry. Pure in-memory state between the snapshot load at
/// startup and the snapshot save at shutdown.
///
/// All lookups compare with exact string equality — no case folding, no
/// trimming.
#[derive(Debug, Default)]
pub struct UserStore {
    users: Vec<User>,
}

impl UserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a loaded snapshot.
    pub fn from_users(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Looks up an account by exact username.
    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Looks up the account currently holding the exact session token.
    pub fn find_by_session(&self, token: &str) -> Option<&User> {
        self.users.iter().find(|u| u.session.raw() == token)
    }

    /// Looks up an account by its id.
    pub fn find_by_guid(&self, guid: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.user_guid == guid)
    }

    /// Whether any account stores the given password hash.
    pub fn any_password_hash(&self, password_sha256: &str) -> bool {
        self.users
            .iter()
            .any(|u| u.password_sha256 == password_sha256)
    }

    /// Adds a new account. The caller (the register flow) has already
    /// established username uniqueness under the same lock.
    pub fn insert(&mut self, user: User) {
        self.users.push(user);
    }

    /// Writes an updated record back over the account with the same id.
    ///
    /// This is the only way existing account state changes. The target must
    /// exist: callers only ever replace a user they just read out of this
    /// store, so a miss is a programming error and fails loudly.
    pub fn replace(&mut self, user: User) {
        let index = self
            .users
            .iter()
            .position(|u| u.user_guid == user.user_guid)
            .expect("replace target must exist in the store");
        self.users[index] = user;
    }

    /// Appends an entry to an account's event log, in place.
    ///
    /// Returns `false` when no account has that id.
    pub fn append_log(
        &mut self,
        guid: Uuid,
        kind: UserLogKind,
        message: impl Into<String>,
    ) -> bool {
        match self.users.iter_mut().find(|u| u.user_guid == guid) {
            Some(user) => {
                user.log(kind, message);
                true
            }
            None => false,
        }
    }

    /// The full account list, for the shutdown snapshot.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::hash_password;

    fn store_with(usernames: &[&str]) -> UserStore {
        let mut store = UserStore::new();
        for name in usernames {
            store.insert(User::new(*name, *name, hash_password(name)));
        }
        store
    }

    #[test]
    fn test_find_by_username_exact_match_only() {
        let store = store_with(&["alice"]);
        assert!(store.find_by_username("alice").is_some());
        // Exact string equality: no case folding.
        assert!(store.find_by_username("Alice").is_none());
        assert!(store.find_by_username("alice ").is_none());
    }

    #[test]
    fn test_find_by_session_matches_current_token() {
        let store = store_with(&["alice"]);
        let token = store
            .find_by_username("alice")
            .unwrap()
            .session
            .raw()
            .to_string();
        assert_eq!(
            store.find_by_session(&token).unwrap().username,
            "alice"
        );
        assert!(store.find_by_session("0000000000000000").is_none());
    }

    #[test]
    fn test_find_by_guid() {
        let store = store_with(&["alice", "bob"]);
        let guid = store.find_by_username("bob").unwrap().user_guid;
        assert_eq!(store.find_by_guid(guid).unwrap().username, "bob");
        assert!(store.find_by_guid(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_any_password_hash_detects_collision() {
        let store = store_with(&["alice"]);
        assert!(store.any_password_hash(&hash_password("alice")));
        assert!(!store.any_password_hash(&hash_password("other")));
    }

    #[test]
    fn test_replace_overwrites_matching_account() {
        let mut store = store_with(&["alice"]);
        let mut updated = store.find_by_username("alice").unwrap().clone();
        updated.nickname = "Alicia".to_string();

        store.replace(updated);

        assert_eq!(
            store.find_by_username("alice").unwrap().nickname,
            "Alicia"
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    #[should_panic(expected = "replace target must exist")]
    fn test_replace_unknown_account_fails_loudly() {
        let mut store = store_with(&["alice"]);
        store.replace(User::new("ghost", "Ghost", hash_password("x")));
    }

    #[test]
    fn test_append_log_writes_into_stored_record() {
        let mut store = store_with(&["alice"]);
        let guid = store.find_by_username("alice").unwrap().user_guid;

        assert!(store.append_log(guid, UserLogKind::Login, "Login success."));

        let log = &store.find_by_username("alice").unwrap().user_log;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "Login success.");
    }

    #[test]
    fn test_append_log_unknown_account_returns_false() {
        let mut store = store_with(&[]);
        assert!(!store.append_log(
            Uuid::new_v4(),
            UserLogKind::Login,
            "nope"
        ));
    }

    #[test]
    fn test_from_users_preserves_snapshot_order() {
        let users = vec![
            User::new("a", "A", hash_password("a")),
            User::new("b", "B", hash_password("b")),
        ];
        let store = UserStore::from_users(users.clone());
        assert_eq!(store.users(), &users[..]);
    }
}

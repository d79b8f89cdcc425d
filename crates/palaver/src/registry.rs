//! Tracking of live connections and who they are logged in as.
//!
//! Every accepted connection starts *unbound*. A confirmed login binds it
//! to an account; a bound connection stays bound until it goes away.
//! Removal is idempotent — the supervising task calls it exactly once
//! after the handler finishes, whichever way the handler exited.

use std::collections::{HashMap, HashSet};

use palaver_transport::ConnectionId;
use uuid::Uuid;

/// The account a connection is logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundUser {
    pub user_guid: Uuid,
    pub username: String,
}

/// Live-connection bookkeeping. Plain data behind the server's lock, like
/// the user store.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    unbound: HashSet<ConnectionId>,
    bound: HashMap<ConnectionId, BoundUser>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a freshly accepted connection.
    pub(crate) fn add_unbound(&mut self, id: ConnectionId) {
        self.unbound.insert(id);
        tracing::debug!(%id, "connection registered");
    }

    /// Binds a connection to the account it just logged in as.
    pub(crate) fn bind(&mut self, id: ConnectionId, user: BoundUser) {
        self.unbound.remove(&id);
        tracing::info!(%id, username = user.username, "connection bound");
        self.bound.insert(id, user);
    }

    /// The account a connection is bound to, if any.
    pub(crate) fn bound_user(&self, id: ConnectionId) -> Option<&BoundUser> {
        self.bound.get(&id)
    }

    /// Forgets a connection, bound or not. Returns whether it was known;
    /// a second removal is a no-op.
    pub(crate) fn remove(&mut self, id: ConnectionId) -> bool {
        let known = self.unbound.remove(&id) || self.bound.remove(&id).is_some();
        if known {
            tracing::debug!(%id, "connection removed");
        }
        known
    }

    /// Number of connections that have not logged in yet.
    pub(crate) fn unbound_count(&self) -> usize {
        self.unbound.len()
    }

    /// Number of logged-in connections.
    pub(crate) fn bound_count(&self) -> usize {
        self.bound.len()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> BoundUser {
        BoundUser {
            user_guid: Uuid::new_v4(),
            username: name.to_string(),
        }
    }

    #[test]
    fn test_accepted_connection_starts_unbound() {
        let mut registry = ConnectionRegistry::new();
        registry.add_unbound(ConnectionId::new(1));
        assert_eq!(registry.unbound_count(), 1);
        assert_eq!(registry.bound_count(), 0);
        assert_eq!(registry.bound_user(ConnectionId::new(1)), None);
    }

    #[test]
    fn test_bind_moves_connection_to_bound() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new(1);
        registry.add_unbound(id);

        registry.bind(id, user("alice"));

        assert_eq!(registry.unbound_count(), 0);
        assert_eq!(registry.bound_count(), 1);
        assert_eq!(registry.bound_user(id).unwrap().username, "alice");
    }

    #[test]
    fn test_remove_unbound_connection() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new(1);
        registry.add_unbound(id);

        assert!(registry.remove(id));
        assert_eq!(registry.unbound_count(), 0);
    }

    #[test]
    fn test_remove_bound_connection() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new(1);
        registry.add_unbound(id);
        registry.bind(id, user("alice"));

        assert!(registry.remove(id));
        assert_eq!(registry.bound_count(), 0);
        assert_eq!(registry.bound_user(id), None);
    }

    #[test]
    fn test_remove_twice_is_a_no_op() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new(1);
        registry.add_unbound(id);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
    }

    #[test]
    fn test_remove_unknown_connection_returns_false() {
        let mut registry = ConnectionRegistry::new();
        assert!(!registry.remove(ConnectionId::new(42)));
    }
}

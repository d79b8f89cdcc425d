//! `PalaverServer` builder and server loop.
//!
//! This is the entry point for running a Palaver server. It ties together
//! all the layers: transport → protocol → users.

use std::sync::Arc;

use palaver_protocol::{AsciiCryptoProvider, CryptoProvider, Wire};
use palaver_transport::{Connection, TcpTransport, Transport};
use palaver_users::{User, UserStore};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinSet;

use crate::PalaverError;
use crate::handler::handle_connection;
use crate::registry::ConnectionRegistry;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The store and
/// the registry are plain data behind one `Mutex` each; every
/// read-decide-write sequence on them happens under a single lock
/// acquisition in the handler.
pub(crate) struct ServerState {
    pub(crate) store: Mutex<UserStore>,
    pub(crate) registry: Mutex<ConnectionRegistry>,
    pub(crate) wire: Wire,
}

/// Builder for configuring and starting a Palaver server.
///
/// # Example
///
/// ```rust,ignore
/// use palaver::PalaverServer;
///
/// let server = PalaverServer::builder()
///     .bind("0.0.0.0:11451")
///     .build()
///     .await?;
/// let users = server.run().await?;
/// ```
pub struct PalaverServerBuilder {
    bind_addr: String,
    crypto: Arc<dyn CryptoProvider>,
    users: Vec<User>,
}

impl PalaverServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:11451".to_string(),
            crypto: Arc::new(AsciiCryptoProvider),
            users: Vec::new(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the crypto provider every connection will use.
    pub fn crypto_provider(mut self, crypto: Arc<dyn CryptoProvider>) -> Self {
        self.crypto = crypto;
        self
    }

    /// Seeds the user store, usually from a loaded snapshot.
    pub fn preload_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<PalaverServer, PalaverError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            store: Mutex::new(UserStore::from_users(self.users)),
            registry: Mutex::new(ConnectionRegistry::new()),
            wire: Wire::new(self.crypto),
        });
        let (shutdown_tx, _) = watch::channel(false);

        Ok(PalaverServer {
            transport,
            state,
            shutdown: Arc::new(shutdown_tx),
        })
    }
}

impl Default for PalaverServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Asks a running server to stop. Cheap to clone, safe to trigger from any
/// task; triggering more than once is harmless.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signals the server and every connection handler to wind down.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// A running Palaver server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PalaverServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl PalaverServer {
    /// Creates a new builder.
    pub fn builder() -> PalaverServerBuilder {
        PalaverServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the shutdown handle fires, then waits for every handler
    /// to finish and returns the final user list for snapshot persistence.
    pub async fn run(mut self) -> Result<Vec<User>, PalaverError> {
        tracing::info!("Palaver server running");

        let mut handlers = JoinSet::new();
        let mut shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let conn_id = conn.id();
                        let state = Arc::clone(&self.state);
                        let handler_shutdown = self.shutdown.subscribe();
                        handlers.spawn(async move {
                            if let Err(e) = handle_connection(
                                conn,
                                Arc::clone(&state),
                                handler_shutdown,
                            )
                            .await
                            {
                                tracing::debug!(
                                    %conn_id, error = %e,
                                    "connection ended with error"
                                );
                            }
                            // Exactly once, whichever way the handler left.
                            state.registry.lock().await.remove(conn_id);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                // Reap finished handlers so the set doesn't grow unbounded.
                Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
            }
        }

        tracing::info!(
            remaining = handlers.len(),
            "waiting for connection handlers"
        );
        while handlers.join_next().await.is_some() {}

        let store = self.state.store.lock().await;
        tracing::info!(accounts = store.len(), "server stopped");
        Ok(store.users().to_vec())
    }
}

//! Transport abstraction layer for Palaver.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the network layer, plus the [`TcpTransport`] implementation the server
//! actually ships: raw TCP with a 4-byte big-endian length prefix in front
//! of every message.
//!
//! The layers above (protocol, dispatcher) only ever see whole messages —
//! one `Vec<u8>` in, one `&[u8]` out. How those messages are delimited on
//! the stream is this crate's problem alone.
//!
//! ```text
//! Dispatcher (packets) → Protocol (payload bytes) → Transport (frames on TCP)
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

/// A unique identifier for a connection, assigned at accept time.
///
/// Newtype over `u64` so a connection id can't be confused with any other
/// counter, and so it can key the dispatcher's registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a connection id from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive whole messages.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next whole message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

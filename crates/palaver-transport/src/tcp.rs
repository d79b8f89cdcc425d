//! TCP transport with 4-byte length framing.
//!
//! Every message on the wire is `[u32 big-endian length][payload]`, where
//! the length counts the payload bytes only. The payload itself is opaque
//! here — the protocol crate decides what the bytes mean.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Frames larger than this are treated as a corrupted stream.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// A length-framed TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted TCP connection");

        Ok(TcpConnection::new(id, addr, stream))
    }
}

/// A single length-framed TCP connection.
///
/// Read and write halves are locked independently so one task can sit in
/// `recv` while another finishes a `send` on the same connection.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpConnection {
    /// Wraps an accepted stream. Also used by tests to build client-side
    /// connections out of `TcpStream::connect`.
    pub fn new(id: ConnectionId, peer: SocketAddr, stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            id,
            peer,
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Returns the remote peer's address, for logging.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer
            .write_u32(data.len() as u32)
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;

        // EOF on the length prefix is a clean close; EOF anywhere later
        // means the peer vanished mid-frame.
        let len = match reader.read_u32().await {
            Ok(len) => len,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            }
            Err(e) => return Err(TransportError::ReceiveFailed(e)),
        };

        if len > MAX_FRAME_LEN {
            return Err(TransportError::ReceiveFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("frame length {len} exceeds limit"),
            )));
        }

        let mut buffer = vec![0u8; len as usize];
        reader
            .read_exact(&mut buffer)
            .await
            .map_err(TransportError::ReceiveFailed)?;

        Ok(Some(buffer))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

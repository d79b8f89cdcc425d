//! Wire protocol for Palaver.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`RequestPacket`], [`ResponsePacket`], [`Command`],
//!   [`ErrorInformation`], …) — the structures that travel on the wire.
//! - **Crypto providers** ([`CryptoProvider`] trait with the shipped
//!   pass-through implementations) — the pluggable text⇄bytes transform
//!   applied to every payload.
//! - **Codec** ([`Wire`]) — how packets become payload bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (framed bytes) and the
//! dispatcher (typed requests). It doesn't know about connections or the
//! user registry — it only knows how to serialize and deserialize packets.
//!
//! ```text
//! Transport (frames) → Protocol (packets) → Dispatcher (auth flows)
//! ```

mod crypto;
mod error;
mod types;
mod wire;

pub use crypto::{AsciiCryptoProvider, CryptoProvider, Utf8CryptoProvider};
pub use error::ProtocolError;
pub use types::{
    Command, ErrorInformation, LoginBySessionRequest, LoginByUnPwRequest,
    LoginResponse, RegisterRequest, RegisterResponse, RequestPacket,
    RequestPayload, ResponseKind, ResponsePacket, ResponsePayload,
};
pub use wire::{Wire, to_host_order, to_network_order};

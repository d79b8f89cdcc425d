//! # Palaver
//!
//! The transport-and-authentication core of the Palaver instant-messaging
//! server: a TCP endpoint speaking length-framed, optionally encrypted
//! JSON command packets, with account registration and two-phase login.
//!
//! The layers live in their own crates — `palaver-transport` (framed TCP),
//! `palaver-protocol` (packets and the wire codec), `palaver-users`
//! (registry and auth flows) — and this meta-crate ties them together into
//! a runnable server plus its persistence files.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use palaver::PalaverServer;
//!
//! # async fn run() -> Result<(), palaver::PalaverError> {
//! let server = PalaverServer::builder()
//!     .bind("127.0.0.1:11451")
//!     .build()
//!     .await?;
//! let users = server.run().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod registry;
mod server;
pub mod settings;
pub mod snapshot;

pub use error::PalaverError;
pub use registry::BoundUser;
pub use server::{PalaverServer, PalaverServerBuilder, ShutdownHandle};
pub use settings::Settings;

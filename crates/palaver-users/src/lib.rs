//! User registry and authentication flows for Palaver.
//!
//! This crate owns everything between "typed request" and "authenticated
//! user":
//!
//! 1. **Data model** — [`User`], [`Session`], the append-only user log.
//! 2. **Store** — [`UserStore`], the in-memory registry with its uniqueness
//!    and single-mutation-path invariants.
//! 3. **Auth flows** — [`register`], [`login_by_password`],
//!    [`login_by_session`], and the two-phase [`LoginConfirmer`].
//! 4. **Error taxonomy** — [`AuthFailure`], the closed set of domain
//!    failures with their wire codes.
//!
//! # Concurrency note
//!
//! Nothing in this crate locks. The store is plain data owned by the server
//! behind a single `tokio::sync::Mutex`; every read-decide-write sequence
//! (uniqueness check + insert, lookup + confirm) happens under one lock
//! acquisition at the call site. Functions that mutate take `&mut UserStore`
//! so the type system enforces exclusive access.

mod auth;
mod error;
mod store;
mod user;

pub use auth::{LoginConfirmer, login_by_password, login_by_session, register};
pub use error::{ADVICE_SEPARATOR, AuthFailure, split_packed};
pub use store::UserStore;
pub use user::{Session, User, UserLogEntry, UserLogKind, hash_password};

//! `vendora-auth` — pure authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: session
//! handling and credential verification live in an outer layer. What crosses
//! into the engine is a resolved [`Caller`], and operations gate on it.

pub mod caller;
pub mod roles;

pub use caller::Caller;
pub use roles::Role;

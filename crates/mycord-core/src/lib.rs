//! mycord core - Shared types for the mycord chat client
//!
//! This crate provides the domain types shared between the wire
//! protocol (`mycord-protocol`) and the terminal client (`mycord-client`).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod run_state;
pub mod settings;
pub mod username;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use run_state::RunState;
pub use settings::{Settings, DEFAULT_HOST, DEFAULT_PORT};
pub use username::{Username, USERNAME_FIELD_LEN, USERNAME_MAX_LEN};

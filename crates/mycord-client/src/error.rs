//! Error types for the mycord client.
//!
//! All error types use `thiserror` for derive macros and carry enough
//! context to be printed straight to the user.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::net::SocketAddrV4;
use std::path::PathBuf;

use mycord_core::DomainError;
use mycord_protocol::ProtocolError;
use thiserror::Error;

// ============================================================================
// Client Error Type
// ============================================================================

/// Client errors, from startup configuration through the live session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML or has unknown keys.
    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No username could be discovered for the local user.
    #[error("Could not determine a username (set USER or `username` in the config file)")]
    UsernameUnavailable,

    /// The discovered username is unusable.
    #[error("Invalid username: {0}")]
    Username(#[from] DomainError),

    /// The server name did not resolve to an IPv4 address.
    #[error("Failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    /// The TCP connection could not be established.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    /// The server closed the stream while the session was still active.
    #[error("Connection lost (read {transferred} bytes of a record)")]
    ConnectionLost { transferred: usize },

    /// The server sent a record kind a client never expects.
    #[error("Invalid message type {code} received from server")]
    UnexpectedMessage { code: u32 },

    /// Record-level transfer failure.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Terminal or socket I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The receive task ended abnormally.
    #[error("Receive task failed: {0}")]
    TaskFailed(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ============================================================================
// Tests
// ============================================================================

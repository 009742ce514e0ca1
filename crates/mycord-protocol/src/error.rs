//! Error types for the wire protocol.

use std::io;
use thiserror::Error;

/// Errors raised while moving records over a stream.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The kind code is not one of the protocol's message kinds.
    ///
    /// Decoding never produces this on its own; it is raised when a caller
    /// asks for the typed kind of a record carrying an unknown code.
    #[error("Unknown message kind {0}")]
    UnknownKind(u32),

    /// The peer closed the stream part-way through (or before) a record.
    #[error("Short read: got {transferred} of {expected} bytes")]
    ShortRead { expected: usize, transferred: usize },

    /// The stream stopped accepting bytes part-way through a record.
    #[error("Short write: sent {transferred} of {expected} bytes")]
    ShortWrite { expected: usize, transferred: usize },

    /// Transport fault other than interruption.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

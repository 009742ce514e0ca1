//! Protocol message kinds and the decoded record type.

use std::borrow::Cow;
use std::fmt;

use mycord_core::{Username, USERNAME_FIELD_LEN};

use crate::error::ProtocolError;

/// Width of the body field in a wire record, in bytes.
pub const BODY_FIELD_LEN: usize = 1024;

/// Longest body that still leaves room for the terminating NUL.
pub const BODY_MAX_LEN: usize = BODY_FIELD_LEN - 1;

/// Message kinds understood by the protocol, with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Client announces itself (client to server)
    Login,
    /// Client leaves (client to server)
    Logout,
    /// Outbound chat line (client to server)
    MessageSend,
    /// Delivered chat line (server to client)
    MessageRecv,
    /// Server is ending the session (server to client)
    Disconnect,
    /// Informational notice (server to client)
    System,
}

impl MessageKind {
    /// Returns the wire code for this kind.
    pub const fn code(self) -> u32 {
        match self {
            Self::Login => 0,
            Self::Logout => 1,
            Self::MessageSend => 2,
            Self::MessageRecv => 10,
            Self::Disconnect => 12,
            Self::System => 13,
        }
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = ProtocolError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Login),
            1 => Ok(Self::Logout),
            2 => Ok(Self::MessageSend),
            10 => Ok(Self::MessageRecv),
            12 => Ok(Self::Disconnect),
            13 => Ok(Self::System),
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::MessageSend => "MESSAGE_SEND",
            Self::MessageRecv => "MESSAGE_RECV",
            Self::Disconnect => "DISCONNECT",
            Self::System => "SYSTEM",
        };
        write!(f, "{name}")
    }
}

/// One protocol record with integer fields in host order.
///
/// The username and body are kept as their fixed-capacity fields. A full
/// field carries no terminator, so the accessors return explicit-length
/// slices that stop at the first NUL or at the end of the field.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    pub(crate) code: u32,
    pub(crate) timestamp: u32,
    pub(crate) username: [u8; USERNAME_FIELD_LEN],
    pub(crate) body: [u8; BODY_FIELD_LEN],
}

impl Message {
    /// Builds a record of the given kind.
    ///
    /// The username is truncated to the full field width. The body is
    /// truncated to [`BODY_MAX_LEN`] bytes so the field always ends in NUL.
    /// Shorter values are NUL padded.
    pub fn new(kind: MessageKind, username: &[u8], body: &[u8]) -> Self {
        Self::from_code(kind.code(), username, body)
    }

    /// Builds a record from a raw kind code, known or not.
    pub fn from_code(code: u32, username: &[u8], body: &[u8]) -> Self {
        Self {
            code,
            timestamp: 0,
            username: fixed_field(username, USERNAME_FIELD_LEN),
            body: fixed_field(body, BODY_MAX_LEN),
        }
    }

    /// Creates a login record.
    pub fn login(username: &Username) -> Self {
        Self::new(MessageKind::Login, username.as_bytes(), b"")
    }

    /// Creates a logout record.
    pub fn logout(username: &Username) -> Self {
        Self::new(MessageKind::Logout, username.as_bytes(), b"")
    }

    /// Creates an outbound chat record.
    pub fn chat(username: &Username, body: &[u8]) -> Self {
        Self::new(MessageKind::MessageSend, username.as_bytes(), body)
    }

    /// Returns a copy carrying the given epoch timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the raw kind code.
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Returns the typed kind.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnknownKind` when the code is outside the
    /// protocol's closed set.
    pub fn kind(&self) -> Result<MessageKind, ProtocolError> {
        MessageKind::try_from(self.code)
    }

    /// Returns the timestamp in seconds since the epoch.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Returns the username bytes up to the first NUL.
    pub fn username(&self) -> &[u8] {
        until_nul(&self.username)
    }

    /// Returns the body bytes up to the first NUL.
    pub fn body(&self) -> &[u8] {
        until_nul(&self.body)
    }

    /// Returns the username as display text.
    pub fn username_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.username())
    }

    /// Returns the body as display text.
    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("code", &self.code)
            .field("timestamp", &self.timestamp)
            .field("username", &self.username_lossy())
            .field("body", &self.body_lossy())
            .finish()
    }
}

fn fixed_field<const N: usize>(src: &[u8], limit: usize) -> [u8; N] {
    let mut field = [0u8; N];
    for (slot, byte) in field.iter_mut().zip(src.iter().take(limit)) {
        *slot = *byte;
    }
    field
}

fn until_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    field.get(..end).unwrap_or_default()
}

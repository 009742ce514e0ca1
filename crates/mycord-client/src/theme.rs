//! Terminal styling for chat output.
//!
//! Plain ANSI SGR sequences; the client writes a line-oriented stream, not a
//! full-screen interface.

/// Terminal bell, emitted once per message that mentions the local user.
pub const BELL: u8 = 0x07;

/// Resets all attributes.
pub const RESET: &str = "\x1b[0m";

/// Visual treatments used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Red: the server is ending the session.
    Alert,
    /// Gray: informational notices.
    Muted,
    /// Bold yellow: the local user was mentioned.
    Mention,
}

impl Tone {
    /// Returns the SGR sequence that starts this tone.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Alert => "\x1b[31m",
            Self::Muted => "\x1b[90m",
            Self::Mention => "\x1b[1;33m",
        }
    }

    /// Appends `text` wrapped in this tone and a reset.
    pub fn paint_into(self, dst: &mut Vec<u8>, text: &[u8]) {
        dst.extend_from_slice(self.code().as_bytes());
        dst.extend_from_slice(text);
        dst.extend_from_slice(RESET.as_bytes());
    }

    /// Returns `text` wrapped in this tone and a reset.
    pub fn paint(self, text: &[u8]) -> Vec<u8> {
        let mut dst = Vec::with_capacity(text.len() + 12);
        self.paint_into(&mut dst, text);
        dst
    }
}

//! The local user's name as it travels on the wire.

use std::fmt;

use crate::error::{DomainError, DomainResult};

/// Width of the username field in a wire record, in bytes.
pub const USERNAME_FIELD_LEN: usize = 32;

/// Usable bytes of a username; one byte of the field is kept for the terminator.
pub const USERNAME_MAX_LEN: usize = USERNAME_FIELD_LEN - 1;

/// A validated local username.
///
/// Construction trims surrounding whitespace (including the trailing newline
/// left behind by shell tools such as `whoami`) and truncates to
/// [`USERNAME_MAX_LEN`] bytes on a character boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Creates a username from raw discovered text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyUsername` if nothing is left after trimming,
    /// and `DomainError::InvalidUsername` if the name contains a NUL or other
    /// control byte.
    pub fn new(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyUsername);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::InvalidUsername {
                value: trimmed.to_string(),
                reason: "contains control characters".to_string(),
            });
        }

        let mut end = trimmed.len().min(USERNAME_MAX_LEN);
        while !trimmed.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        let capped = trimmed.get(..end).unwrap_or_default();
        if capped.is_empty() {
            return Err(DomainError::EmptyUsername);
        }

        Ok(Self(capped.to_string()))
    }

    /// Returns the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the username bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the byte pattern that marks a mention of this user: `@` followed
    /// by the name, capped to the username field width.
    pub fn mention_pattern(&self) -> Vec<u8> {
        let mut pattern = Vec::with_capacity(USERNAME_FIELD_LEN);
        pattern.push(b'@');
        pattern.extend_from_slice(self.as_bytes());
        pattern.truncate(USERNAME_FIELD_LEN);
        pattern
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

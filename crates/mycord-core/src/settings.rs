//! Connection settings resolved at startup.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::username::Username;

/// Default server address when neither `--ip` nor `--domain` is given.
pub const DEFAULT_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Connection settings for one client run.
///
/// Built once from arguments and username discovery, then shared read-only
/// by the receive task and the send loop. The live socket and the run-state
/// are owned by the session driver rather than stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Resolved IPv4 endpoint of the chat server.
    pub server: SocketAddrV4,

    /// Suppresses the bell and mention highlighting.
    pub quiet: bool,

    /// Name sent in every outbound record.
    pub username: Username,
}

impl Settings {
    /// Creates settings for the given endpoint and user.
    pub fn new(server: SocketAddrV4, username: Username) -> Self {
        Self {
            server,
            quiet: false,
            username,
        }
    }

    /// Returns a copy with quiet mode set.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

//! mycord client - Library modules
//!
//! This library provides the pieces of the `mycord` terminal chat client.
//!
//! # Architecture
//!
//! A session runs two loops over one TCP connection:
//!
//! 1. **Receive Task**: Reads records from the server and renders them to stdout
//! 2. **Send Loop**: Reads terminal lines on the main task and sends them as chat records
//!
//! Both loops, and the signal listener, share a `RunState`. Whichever side
//! ends first stops it; the other side sees the stop and unwinds.

pub mod client;
pub mod config;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod receiver;
pub mod sender;
pub mod theme;

// Re-export commonly used types
pub use client::{connect, spawn_signal_listener, Session, SessionOutcome};
pub use config::{discover_username, Args, ClientConfig, FileConfig, ServerHost};
pub use error::{ClientError, Result};
pub use receiver::{ReceiveOutcome, Receiver};
pub use sender::{InputRejection, SendOutcome, Sender};

//! mycord protocol - Wire format for chat server communication
//!
//! Every exchange in either direction is one fixed-size record of
//! [`RECORD_SIZE`] bytes:
//!
//! ```text
//! +------------+-----------------+----------------+---------------+
//! | kind (u32) | timestamp (u32) | username [32]  | body [1024]   |
//! | big endian | big endian      | NUL padded     | NUL padded    |
//! +------------+-----------------+----------------+---------------+
//! ```
//!
//! There is no length prefix and no delimiter; record boundaries follow
//! from the fixed size alone, which is why every transfer goes through
//! [`transfer::read_exact`] and [`transfer::write_exact`].

pub mod error;
pub mod frame;
pub mod message;
pub mod transfer;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{Record, RECORD_SIZE};
pub use message::{Message, MessageKind, BODY_FIELD_LEN, BODY_MAX_LEN};
pub use transfer::{read_message, write_message};

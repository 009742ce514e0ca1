//! Fixed-size record encoding.

use mycord_core::USERNAME_FIELD_LEN;

use crate::message::{Message, BODY_FIELD_LEN};

/// Size of every record on the wire, whatever its kind.
pub const RECORD_SIZE: usize = 4 + 4 + USERNAME_FIELD_LEN + BODY_FIELD_LEN;

/// One raw record as it travels on the wire.
pub type Record = [u8; RECORD_SIZE];

/// Encodes a message with both integer fields in network byte order.
pub fn encode(message: &Message) -> Record {
    let mut record = [0u8; RECORD_SIZE];
    let bytes = message
        .code
        .to_be_bytes()
        .into_iter()
        .chain(message.timestamp.to_be_bytes())
        .chain(message.username)
        .chain(message.body);
    for (slot, byte) in record.iter_mut().zip(bytes) {
        *slot = byte;
    }
    record
}

/// Decodes a raw record.
///
/// Unknown kind codes are carried through untouched; deciding what to do with
/// them is the receiver's job. Text fields are not checked for printability.
pub fn decode(record: &Record) -> Message {
    let mut rest: &[u8] = record;
    let code = u32::from_be_bytes(take(&mut rest));
    let timestamp = u32::from_be_bytes(take(&mut rest));
    let username = take(&mut rest);
    let body = take(&mut rest);
    Message {
        code,
        timestamp,
        username,
        body,
    }
}

fn take<const N: usize>(rest: &mut &[u8]) -> [u8; N] {
    match rest.split_first_chunk::<N>() {
        Some((head, tail)) => {
            *rest = tail;
            *head
        }
        None => [0u8; N],
    }
}

//! Guaranteed-complete transfers over a byte stream.
//!
//! A record boundary can only be violated here, so both directions go
//! through the same rules: keep going until every byte has moved, retry on
//! `Interrupted`, report a peer that stops early as a short count rather
//! than an error, and surface every other fault unchanged.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{self, RECORD_SIZE};
use crate::message::Message;

/// Reads until `buf` is full or the peer closes.
///
/// Returns the number of bytes read, which is less than `buf.len()` only
/// when the stream reached end-of-file first.
///
/// # Errors
///
/// Any I/O error other than `ErrorKind::Interrupted`.
pub async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while let Some(dst) = buf.get_mut(filled..).filter(|rest| !rest.is_empty()) {
        match reader.read(dst).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                trace!("Read interrupted, retrying");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Writes until all of `buf` is accepted or the peer stops accepting.
///
/// Returns the number of bytes written, which is less than `buf.len()` only
/// when the stream accepted zero bytes.
///
/// # Errors
///
/// Any I/O error other than `ErrorKind::Interrupted`.
pub async fn write_exact<W>(writer: &mut W, buf: &[u8]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut sent = 0;
    while let Some(src) = buf.get(sent..).filter(|rest| !rest.is_empty()) {
        match writer.write(src).await {
            Ok(0) => break,
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                trace!("Write interrupted, retrying");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(sent)
}

/// Reads and decodes exactly one record.
///
/// # Errors
///
/// `ProtocolError::ShortRead` if the peer closed before a whole record
/// arrived (including a clean close between records, reported with
/// `transferred: 0`), `ProtocolError::Io` for transport faults.
pub async fn read_message<R>(reader: &mut R) -> ProtocolResult<Message>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut record = [0u8; RECORD_SIZE];
    let transferred = read_exact(reader, &mut record).await?;
    if transferred < RECORD_SIZE {
        return Err(ProtocolError::ShortRead {
            expected: RECORD_SIZE,
            transferred,
        });
    }
    Ok(frame::decode(&record))
}

/// Encodes and writes exactly one record.
///
/// # Errors
///
/// `ProtocolError::ShortWrite` if the stream stopped accepting bytes,
/// `ProtocolError::Io` for transport faults.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let record = frame::encode(message);
    let transferred = write_exact(writer, &record).await?;
    if transferred < RECORD_SIZE {
        return Err(ProtocolError::ShortWrite {
            expected: RECORD_SIZE,
            transferred,
        });
    }
    writer.flush().await?;
    Ok(())
}

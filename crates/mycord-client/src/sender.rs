//! Send side of a chat session.
//!
//! The send loop runs on the main task. It reads terminal lines, turns valid
//! ones into `MESSAGE_SEND` records, and leaves through one of three doors:
//! local end-of-input (or an input error), the shared run-state being
//! stopped elsewhere, or a failed write. On the way out it stops the
//! run-state first and then sends `LOGOUT`, so a server that hangs up right
//! after the logout is seen by the receiver as a deliberate close.

use std::io::{self, Write};
use std::sync::Arc;

use mycord_core::{RunState, Username};
use mycord_protocol::{write_message, Message, BODY_MAX_LEN};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite};
use tracing::{debug, info, trace, warn};

use crate::error::ClientError;

// ============================================================================
// Line Validation
// ============================================================================

/// Why a typed line was not sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    #[error("message is empty")]
    Empty,

    #[error("message is too long ({len} bytes, limit is {max})", max = BODY_MAX_LEN)]
    TooLong { len: usize },

    #[error("message contains a line break")]
    EmbeddedNewline,

    #[error("message contains non-printable characters")]
    NonPrintable,
}

/// Removes one trailing line break (`\n` or `\r\n`), if present.
pub fn strip_line_break(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Checks a line (already stripped of its line break) for sending.
///
/// Accepted lines are 1 to [`BODY_MAX_LEN`] bytes of printable ASCII.
///
/// # Errors
///
/// Returns the first rule the line breaks.
pub fn validate_line(line: &[u8]) -> Result<&[u8], InputRejection> {
    if line.is_empty() {
        return Err(InputRejection::Empty);
    }
    if line.len() > BODY_MAX_LEN {
        return Err(InputRejection::TooLong { len: line.len() });
    }
    if line.contains(&b'\n') {
        return Err(InputRejection::EmbeddedNewline);
    }
    if !line.iter().all(|b| matches!(b, b' '..=b'~')) {
        return Err(InputRejection::NonPrintable);
    }
    Ok(line)
}

// ============================================================================
// Outcome
// ============================================================================

/// Why the send loop ended.
#[derive(Debug)]
pub enum SendOutcome {
    /// Terminal input reached end-of-file.
    InputClosed,
    /// Reading terminal input failed.
    InputFailed(io::Error),
    /// The run-state was stopped by a signal or by the receiver.
    Stopped,
    /// A chat record could not be written in full.
    WriteFailed(ClientError),
}

// ============================================================================
// Line Reading
// ============================================================================

/// Most bytes of one input line kept in memory: a full body plus `\r\n`.
const LINE_LIMIT: usize = BODY_MAX_LEN + 2;

/// Result of reading one terminal line.
enum LineRead {
    /// `line` holds a line, with its line break if it had one.
    Line,
    /// The line ran past [`LINE_LIMIT`]; the rest of it was discarded.
    Overlong { len: usize },
    /// End of input with nothing buffered.
    Eof,
}

/// Reads one line into `line`, keeping at most [`LINE_LIMIT`] bytes.
///
/// `Interrupted` is retried without losing the bytes already read. An
/// over-long line is drained up to and including its line break.
async fn read_line<I>(input: &mut I, line: &mut Vec<u8>) -> io::Result<LineRead>
where
    I: AsyncBufRead + Unpin,
{
    loop {
        let remaining = LINE_LIMIT.saturating_sub(line.len());
        if remaining == 0 {
            let dropped = discard_rest_of_line(input).await?;
            return Ok(LineRead::Overlong {
                len: line.len() + dropped,
            });
        }

        match (&mut *input).take(remaining as u64).read_until(b'\n', line).await {
            Ok(0) if line.is_empty() => return Ok(LineRead::Eof),
            Ok(0) => return Ok(LineRead::Line),
            Ok(_) if line.ends_with(b"\n") => return Ok(LineRead::Line),
            // Either the cap was hit or input ended mid-line; the next pass tells which
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                trace!(buffered = line.len(), "Input read interrupted, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

/// Consumes input through the next line break or end of input.
///
/// Returns the number of bytes dropped, not counting the line break.
async fn discard_rest_of_line<I>(input: &mut I) -> io::Result<usize>
where
    I: AsyncBufRead + Unpin,
{
    let mut dropped = 0;
    loop {
        let (used, done) = match input.fill_buf().await {
            Ok(available) => match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    dropped += pos;
                    (pos + 1, true)
                }
                None => {
                    dropped += available.len();
                    (available.len(), available.is_empty())
                }
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        input.consume(used);
        if done {
            return Ok(dropped);
        }
    }
}

// ============================================================================
// Sender
// ============================================================================

/// Reads terminal lines and writes them to the server as chat records.
pub struct Sender<D> {
    username: Username,
    run_state: Arc<RunState>,
    diag: D,
}

impl<D: Write> Sender<D> {
    /// Creates a sender that reports rejected lines to `diag`.
    pub fn new(username: Username, run_state: Arc<RunState>, diag: D) -> Self {
        Self {
            username,
            run_state,
            diag,
        }
    }

    /// Runs the send loop, then stops the run-state and logs out.
    ///
    /// The logout is best-effort: a failure is reported but does not change
    /// the returned outcome.
    pub async fn run<I, W>(&mut self, input: &mut I, writer: &mut W) -> SendOutcome
    where
        I: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Send loop started");
        let outcome = self.pump(input, writer).await;
        debug!(outcome = ?outcome, "Send loop finished");

        if let SendOutcome::WriteFailed(e) = &outcome {
            let _ = writeln!(self.diag, "failed to send message: {e}");
        }

        self.run_state.stop();

        if let Err(e) = write_message(writer, &Message::logout(&self.username)).await {
            warn!(error = %e, "Failed to send logout");
            let _ = writeln!(self.diag, "failed to send logout: {e}");
        } else {
            debug!("Logout sent");
        }

        outcome
    }

    async fn pump<I, W>(&mut self, input: &mut I, writer: &mut W) -> SendOutcome
    where
        I: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::with_capacity(LINE_LIMIT);

        while self.run_state.is_running() {
            line.clear();

            let read = tokio::select! {
                biased;
                () = self.run_state.stopped() => return SendOutcome::Stopped,
                read = read_line(input, &mut line) => read,
            };

            let checked = match read {
                Ok(LineRead::Eof) => {
                    info!("End of input");
                    return SendOutcome::InputClosed;
                }
                Ok(LineRead::Line) => validate_line(strip_line_break(&line)),
                Ok(LineRead::Overlong { len }) => Err(InputRejection::TooLong { len }),
                Err(e) => {
                    warn!(error = %e, "Reading input failed");
                    return SendOutcome::InputFailed(e);
                }
            };

            let body = match checked {
                Ok(body) => body,
                Err(rejection) => {
                    debug!(reason = %rejection, "Rejected input line");
                    let _ = writeln!(self.diag, "invalid message: {rejection}");
                    continue;
                }
            };

            let message = Message::chat(&self.username, body);
            if let Err(e) = write_message(writer, &message).await {
                warn!(error = %e, "Sending message failed");
                return SendOutcome::WriteFailed(e.into());
            }
            debug!(len = body.len(), "Message sent");
        }

        SendOutcome::Stopped
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mycord_protocol::{frame, MessageKind, RECORD_SIZE};
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncRead, BufReader, ReadBuf};

    fn decode_all(bytes: &[u8]) -> Vec<Message> {
        bytes
            .chunks(RECORD_SIZE)
            .map(|chunk| {
                let record: frame::Record = chunk.try_into().unwrap();
                frame::decode(&record)
            })
            .collect()
    }

    fn sender(run_state: Arc<RunState>, diag: &mut Vec<u8>) -> Sender<&mut Vec<u8>> {
        Sender::new(Username::new("alice").unwrap(), run_state, diag)
    }

    /// Terminal input that replays a fixed list of reads, errors included.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Scripted {
        fn new(steps: Vec<io::Result<Vec<u8>>>) -> BufReader<Self> {
            BufReader::new(Self(steps.into()))
        }
    }

    impl AsyncRead for Scripted {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.0.pop_front() {
                Some(Ok(chunk)) => {
                    buf.put_slice(&chunk);
                    Poll::Ready(Ok(()))
                }
                Some(Err(e)) => Poll::Ready(Err(e)),
                None => Poll::Ready(Ok(())),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    #[test]
    fn test_strip_line_break() {
        assert_eq!(strip_line_break(b"hi\n"), b"hi");
        assert_eq!(strip_line_break(b"hi\r\n"), b"hi");
        assert_eq!(strip_line_break(b"hi"), b"hi");
        assert_eq!(strip_line_break(b"hi\n\n"), b"hi\n");
    }

    #[test]
    fn test_validate_accepts_printable_ascii() {
        assert_eq!(validate_line(b"hello, world!"), Ok(&b"hello, world!"[..]));
        assert_eq!(validate_line(b"~"), Ok(&b"~"[..]));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(validate_line(b""), Err(InputRejection::Empty));
    }

    #[test]
    fn test_validate_length_bounds() {
        let max = vec![b'a'; BODY_MAX_LEN];
        assert!(validate_line(&max).is_ok());

        let over = vec![b'a'; BODY_MAX_LEN + 1];
        assert_eq!(
            validate_line(&over),
            Err(InputRejection::TooLong { len: 1024 })
        );
    }

    #[test]
    fn test_validate_rejects_embedded_newline() {
        assert_eq!(validate_line(b"one\ntwo"), Err(InputRejection::EmbeddedNewline));
    }

    #[test]
    fn test_validate_rejects_non_printable() {
        assert_eq!(validate_line(b"tab\there"), Err(InputRejection::NonPrintable));
        assert_eq!(validate_line(b"bell\x07"), Err(InputRejection::NonPrintable));
        assert_eq!(validate_line("caf\u{e9}".as_bytes()), Err(InputRejection::NonPrintable));
    }

    // ------------------------------------------------------------------------
    // Send loop
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_sends_valid_lines_then_logout_on_eof() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut input = BufReader::new(&b"hello\nsecond line\n"[..]);

        let outcome = sender(Arc::clone(&run_state), &mut diag)
            .run(&mut input, &mut wire)
            .await;

        assert!(matches!(outcome, SendOutcome::InputClosed));
        assert!(!run_state.is_running());

        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].kind().unwrap(), MessageKind::MessageSend);
        assert_eq!(sent[0].username(), b"alice");
        assert_eq!(sent[0].body(), b"hello");
        assert_eq!(sent[1].body(), b"second line");
        assert_eq!(sent[2].kind().unwrap(), MessageKind::Logout);
        assert!(diag.is_empty());
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_sent() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut input = BufReader::new(&b"no newline"[..]);

        sender(run_state, &mut diag).run(&mut input, &mut wire).await;

        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body(), b"no newline");
    }

    #[tokio::test]
    async fn test_invalid_lines_are_reported_and_skipped() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut raw = b"\n".to_vec();
        raw.extend(vec![b'x'; 1024]);
        raw.extend_from_slice(b"\nbad\x01char\nok\n");
        let mut input = BufReader::new(raw.as_slice());

        let outcome = sender(Arc::clone(&run_state), &mut diag)
            .run(&mut input, &mut wire)
            .await;

        assert!(matches!(outcome, SendOutcome::InputClosed));
        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body(), b"ok");
        assert_eq!(sent[1].kind().unwrap(), MessageKind::Logout);

        let diag = String::from_utf8(diag).unwrap();
        assert_eq!(diag.matches("invalid message").count(), 3);
        assert!(diag.contains("empty"));
        assert!(diag.contains("too long"));
        assert!(diag.contains("non-printable"));
    }

    #[tokio::test]
    async fn test_rejected_line_does_not_touch_run_state() {
        let run_state = Arc::new(RunState::new());
        let (mut feed, source) = tokio::io::duplex(64);
        let mut input = BufReader::new(source);
        let mut diag = Vec::new();
        let mut wire = Vec::new();

        let state = Arc::clone(&run_state);
        let driver = async {
            tokio::io::AsyncWriteExt::write_all(&mut feed, b"\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(state.is_running());
            state.stop();
        };
        let mut tx = sender(Arc::clone(&run_state), &mut diag);
        let ((), outcome) = tokio::join!(driver, tx.run(&mut input, &mut wire));

        assert!(matches!(outcome, SendOutcome::Stopped));
        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind().unwrap(), MessageKind::Logout);
    }

    #[tokio::test]
    async fn test_stop_wakes_blocked_input() {
        let run_state = Arc::new(RunState::new());
        // Keep the feed end alive so input never reaches EOF
        let (_feed, source) = tokio::io::duplex(64);
        let mut input = BufReader::new(source);
        let mut diag = Vec::new();
        let mut wire = Vec::new();

        let state = Arc::clone(&run_state);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            state.stop();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            sender(Arc::clone(&run_state), &mut diag).run(&mut input, &mut wire),
        )
        .await
        .expect("send loop should wake on stop");

        assert!(matches!(outcome, SendOutcome::Stopped));
        assert_eq!(decode_all(&wire).len(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_input_keeps_partial_line() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut input = Scripted::new(vec![
            Ok(b"hel".to_vec()),
            Err(io::ErrorKind::Interrupted.into()),
            Ok(b"lo\n".to_vec()),
        ]);

        let outcome = sender(run_state, &mut diag).run(&mut input, &mut wire).await;

        assert!(matches!(outcome, SendOutcome::InputClosed));
        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body(), b"hello");
        assert_eq!(sent[1].kind().unwrap(), MessageKind::Logout);
        assert!(diag.is_empty());
    }

    #[tokio::test]
    async fn test_input_error_ends_loop_and_logs_out() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut input = Scripted::new(vec![
            Ok(b"first\n".to_vec()),
            Err(io::ErrorKind::BrokenPipe.into()),
        ]);

        let outcome = sender(Arc::clone(&run_state), &mut diag)
            .run(&mut input, &mut wire)
            .await;

        assert!(matches!(outcome, SendOutcome::InputFailed(_)));
        assert!(!run_state.is_running());
        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body(), b"first");
        assert_eq!(sent[1].kind().unwrap(), MessageKind::Logout);
    }

    #[tokio::test]
    async fn test_overlong_line_is_drained_and_rejected() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut raw = vec![b'x'; 5000];
        raw.extend_from_slice(b"\nok\n");
        let mut input = BufReader::new(raw.as_slice());

        sender(run_state, &mut diag).run(&mut input, &mut wire).await;

        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body(), b"ok");
        let diag = String::from_utf8(diag).unwrap();
        assert_eq!(diag.matches("invalid message").count(), 1);
        assert!(diag.contains("too long (5000 bytes"));
    }

    #[tokio::test]
    async fn test_full_body_with_crlf_fits() {
        let run_state = Arc::new(RunState::new());
        let mut diag = Vec::new();
        let mut wire = Vec::new();
        let mut raw = vec![b'y'; BODY_MAX_LEN];
        raw.extend_from_slice(b"\r\n");
        let mut input = BufReader::new(raw.as_slice());

        sender(run_state, &mut diag).run(&mut input, &mut wire).await;

        let sent = decode_all(&wire);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body().len(), BODY_MAX_LEN);
        assert!(diag.is_empty());
    }

    #[tokio::test]
    async fn test_read_line_caps_buffer() {
        let raw = vec![b'z'; 10 * LINE_LIMIT];
        let mut input = BufReader::new(raw.as_slice());
        let mut line = Vec::new();

        let read = read_line(&mut input, &mut line).await.unwrap();

        assert!(matches!(read, LineRead::Overlong { len } if len == 10 * LINE_LIMIT));
        assert_eq!(line.len(), LINE_LIMIT);
        assert!(matches!(
            read_line(&mut input, &mut Vec::new()).await.unwrap(),
            LineRead::Eof
        ));
    }
}

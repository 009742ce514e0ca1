//! Receive side of a chat session.
//!
//! The [`Receiver`] owns the read half of the connection and runs as its own
//! task. It reads one fixed-size record at a time, renders it, and stops on
//! the first terminal condition:
//!
//! - `DISCONNECT` from the server: clean, after printing the reason
//! - end of stream while the run-state is already stopped: clean, the close
//!   was part of a deliberate shutdown
//! - end of stream while still running, a transport fault, or a record kind
//!   a client never receives: error
//!
//! Whatever the reason, the receiver stops the shared run-state on the way
//! out so the send loop wakes up and logs out.

use std::io::Write;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use mycord_core::{RunState, Settings};
use mycord_protocol::{read_message, Message, MessageKind, ProtocolError};
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::highlight::highlight_mentions;
use crate::theme::Tone;

/// Format of the timestamp shown on chat lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Outcome
// ============================================================================

/// How the receive loop ended.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// The stream closed after the session had already been stopped.
    Closed,
    /// The server ended the session with a `DISCONNECT` record.
    Disconnected {
        /// Reason text sent by the server.
        reason: String,
    },
    /// The session ended on a transport or protocol fault.
    Failed(ClientError),
}

impl ReceiveOutcome {
    /// Returns true for the non-error terminal states.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// What the loop does after handling one record.
enum Flow {
    Continue,
    Disconnect(String),
}

// ============================================================================
// Receiver
// ============================================================================

/// Reads records from the server and renders them to the terminal.
pub struct Receiver<O, E> {
    settings: Arc<Settings>,
    run_state: Arc<RunState>,
    out: O,
    err: E,
    mention: Vec<u8>,
}

impl<O, E> Receiver<O, E>
where
    O: Write,
    E: Write,
{
    /// Creates a receiver that prints chat to `out` and diagnostics to `err`.
    pub fn new(settings: Arc<Settings>, run_state: Arc<RunState>, out: O, err: E) -> Self {
        let mention = settings.username.mention_pattern();
        Self {
            settings,
            run_state,
            out,
            err,
            mention,
        }
    }

    /// Runs until a terminal condition, then stops the run-state.
    pub async fn run<R>(mut self, mut reader: R) -> ReceiveOutcome
    where
        R: AsyncRead + Unpin,
    {
        info!("Receive loop started");

        let outcome = loop {
            let message = match read_message(&mut reader).await {
                Ok(message) => message,
                Err(ProtocolError::ShortRead { transferred, .. }) => {
                    if self.run_state.is_running() {
                        warn!(transferred, "Server closed the connection mid-session");
                        break ReceiveOutcome::Failed(ClientError::ConnectionLost { transferred });
                    }
                    debug!(transferred, "Stream closed during shutdown");
                    break ReceiveOutcome::Closed;
                }
                Err(e) => {
                    warn!(error = %e, "Receive failed");
                    break ReceiveOutcome::Failed(e.into());
                }
            };

            debug!(code = message.code(), "Received record");

            match self.handle(&message) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Disconnect(reason)) => {
                    info!(reason = %reason, "Server disconnected us");
                    break ReceiveOutcome::Disconnected { reason };
                }
                Err(e) => break ReceiveOutcome::Failed(e),
            }
        };

        if let ReceiveOutcome::Failed(e) = &outcome {
            let _ = writeln!(self.err, "{e}");
        }
        self.run_state.stop();
        info!(clean = outcome.is_clean(), "Receive loop finished");
        outcome
    }

    /// Renders one record and decides whether the loop goes on.
    fn handle(&mut self, message: &Message) -> Result<Flow> {
        match message.kind() {
            Ok(MessageKind::MessageRecv) => {
                let line = self.render_chat(message);
                self.emit(&line)?;
                Ok(Flow::Continue)
            }
            Ok(MessageKind::System) => {
                let line = render_notice(Tone::Muted, "SYSTEM", message.body());
                self.emit(&line)?;
                Ok(Flow::Continue)
            }
            Ok(MessageKind::Disconnect) => {
                let line = render_notice(Tone::Alert, "DISCONNECT", message.body());
                self.emit(&line)?;
                Ok(Flow::Disconnect(message.body_lossy().into_owned()))
            }
            Ok(MessageKind::Login | MessageKind::Logout | MessageKind::MessageSend) | Err(_) => {
                warn!(code = message.code(), "Unexpected record kind from server");
                Err(ClientError::UnexpectedMessage {
                    code: message.code(),
                })
            }
        }
    }

    /// Formats a `MESSAGE_RECV` record as `[time] user: body`.
    fn render_chat(&self, message: &Message) -> Vec<u8> {
        let mut line = format!("[{}] ", format_timestamp(message.timestamp())).into_bytes();
        line.extend_from_slice(message.username());
        line.extend_from_slice(b": ");

        if self.settings.quiet {
            line.extend_from_slice(message.body());
        } else {
            let highlighted = highlight_mentions(message.body(), &self.mention);
            if highlighted.mentions > 0 {
                debug!(mentions = highlighted.mentions, "Mentioned in message");
            }
            line.extend(highlighted.bytes);
        }

        line.push(b'\n');
        line
    }

    fn emit(&mut self, line: &[u8]) -> Result<()> {
        self.out.write_all(line)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Formats a server notice as `LABEL: body` in the given tone.
fn render_notice(tone: Tone, label: &str, body: &[u8]) -> Vec<u8> {
    let mut text = Vec::with_capacity(label.len() + body.len() + 2);
    text.extend_from_slice(label.as_bytes());
    text.extend_from_slice(b": ");
    text.extend_from_slice(body);

    let mut line = tone.paint(&text);
    line.push(b'\n');
    line
}

/// Formats an epoch timestamp in local time.
///
/// Falls back to the raw number if the local zone cannot represent it.
pub fn format_timestamp(epoch: u32) -> String {
    match Local.timestamp_opt(i64::from(epoch), 0).earliest() {
        Some(time) => time.format(TIMESTAMP_FORMAT).to_string(),
        None => epoch.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

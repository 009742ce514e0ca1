//! Session driver.
//!
//! Wires the two halves of a chat session together:
//!
//! - the receive loop runs as a spawned task owning the read half
//! - the send loop runs on the calling task owning the write half
//! - an optional signal listener stops the shared run-state on SIGINT/SIGTERM
//!
//! The driver sends `LOGIN`, runs the send loop to completion, joins the
//! receive task, and only then drops the write half so the socket closes
//! exactly once.
//!
//! A blocked socket read is not cancelled when the send loop stops. The
//! receive task ends when the server reacts to `LOGOUT` (close or
//! `DISCONNECT`), so a server that ignores `LOGOUT` keeps the join waiting.

use std::io::Write;
use std::sync::Arc;

use mycord_core::{RunState, Settings};
use mycord_protocol::{write_message, Message};
use tokio::io::AsyncBufRead;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{ClientError, Result};
use crate::receiver::{ReceiveOutcome, Receiver};
use crate::sender::{SendOutcome, Sender};

/// Opens the TCP connection to the configured server.
///
/// # Errors
///
/// Returns `ClientError::Connect` if the connection cannot be established.
pub async fn connect(settings: &Settings) -> Result<TcpStream> {
    let stream = TcpStream::connect(settings.server)
        .await
        .map_err(|source| ClientError::Connect {
            addr: settings.server,
            source,
        })?;
    info!(server = %settings.server, "Connected");
    Ok(stream)
}

// ============================================================================
// Session Outcome
// ============================================================================

/// How both loops of a session ended.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Terminal state of the send loop.
    pub send: SendOutcome,
    /// Terminal state of the receive loop.
    pub receive: ReceiveOutcome,
}

impl SessionOutcome {
    /// Returns true if the receive loop ended cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.receive.is_clean()
    }

    /// Process exit code: 0 for a clean receive outcome, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One connected chat session.
pub struct Session {
    settings: Arc<Settings>,
    run_state: Arc<RunState>,
    stream: TcpStream,
}

impl Session {
    /// Creates a session over an established connection.
    ///
    /// The run-state starts out running.
    pub fn new(settings: Settings, stream: TcpStream) -> Self {
        Self {
            settings: Arc::new(settings),
            run_state: Arc::new(RunState::new()),
            stream,
        }
    }

    /// Returns a handle to the session's run-state.
    pub fn run_state(&self) -> Arc<RunState> {
        Arc::clone(&self.run_state)
    }

    /// Runs the session until both loops have finished.
    ///
    /// Chat lines go to `out`, receive-side faults to `err`, and rejected
    /// input lines to `diag`.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOGIN` cannot be sent. Faults after that point
    /// are reported through the returned [`SessionOutcome`].
    pub async fn run<I, O, E, D>(self, mut input: I, out: O, err: E, diag: D) -> Result<SessionOutcome>
    where
        I: AsyncBufRead + Unpin,
        O: Write + Send + 'static,
        E: Write + Send + 'static,
        D: Write,
    {
        let Self {
            settings,
            run_state,
            stream,
        } = self;
        let (reader, mut writer) = stream.into_split();

        write_message(&mut writer, &Message::login(&settings.username)).await?;
        info!(username = %settings.username, "Logged in");

        let receiver = Receiver::new(Arc::clone(&settings), Arc::clone(&run_state), out, err);
        let receive_task = tokio::spawn(receiver.run(reader));

        let mut sender = Sender::new(settings.username.clone(), Arc::clone(&run_state), diag);
        let send = sender.run(&mut input, &mut writer).await;

        info!("Waiting for receive loop");
        let receive = match receive_task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Receive task failed");
                ReceiveOutcome::Failed(ClientError::TaskFailed(e.to_string()))
            }
        };

        drop(writer);
        info!(clean = receive.is_clean(), "Session ended");

        Ok(SessionOutcome { send, receive })
    }
}

// ============================================================================
// Signals
// ============================================================================

/// Spawns a task that stops `run_state` on SIGINT or SIGTERM.
///
/// The listener does nothing else; the loops see the stop and unwind.
pub fn spawn_signal_listener(run_state: Arc<RunState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            warn!(error = %e, "Error waiting for shutdown signal");
            return;
        }
        if run_state.stop() {
            info!("Shutdown signal received");
        }
    })
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

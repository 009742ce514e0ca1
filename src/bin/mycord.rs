//! mycord - Terminal chat client
//!
//! Connects to a mycord server, logs in with the local username, prints
//! incoming chat to stdout and sends every line typed on stdin.
//!
//! # Usage
//!
//! ```text
//! mycord                        # 127.0.0.1:8080
//! mycord --port 1738            # 127.0.0.1:1738
//! mycord --domain example.com   # example.com:8080
//! mycord --quiet                # no bell, no mention highlighting
//! ```
//!
//! End the session with Ctrl+D (end of input) or Ctrl+C.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mycord_client::{
    connect, discover_username, logging, spawn_signal_listener, Args, ClientConfig, FileConfig,
    Session,
};
use mycord_core::Settings;
use tokio::io::BufReader;
use tracing::{error, info};

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let args = Args::parse();

    // Log to a file; stdout carries the chat and stderr the diagnostics
    logging::init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("mycord: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(args));

    // A pending stdin read never completes on its own, so don't wait for it
    runtime.shutdown_background();

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("mycord: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Sets up the session and runs it, returning the process exit code.
async fn run(args: Args) -> Result<u8> {
    info!(version = env!("CARGO_PKG_VERSION"), "mycord starting");

    let file = FileConfig::load(&args).context("Failed to load configuration")?;
    let config = ClientConfig::from_sources(&args, file);

    let username = discover_username(config.username.as_deref())?;
    let server = config.resolve().await?;
    let settings = Settings::new(server, username).with_quiet(config.quiet);

    let stream = connect(&settings).await?;
    let session = Session::new(settings, stream);
    let _signals = spawn_signal_listener(session.run_state());

    let input = BufReader::new(tokio::io::stdin());
    let outcome = session
        .run(input, io::stdout(), io::stderr(), io::stderr())
        .await
        .context("Failed to log in")?;

    info!(exit_code = outcome.exit_code(), "mycord exiting");
    Ok(outcome.exit_code())
}

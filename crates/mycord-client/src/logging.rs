//! Diagnostic logging setup.
//!
//! The terminal belongs to the chat, so tracing output goes to a log file
//! instead of stderr. If the file cannot be opened, logging is turned off
//! and a one-line warning is printed before the session starts.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "client.log";

/// Returns the path to the log file directory.
///
/// Uses `$XDG_STATE_HOME/mycord` if set, otherwise
/// `$HOME/.local/state/mycord`.
pub fn log_dir() -> Option<PathBuf> {
    log_dir_from(
        std::env::var_os("XDG_STATE_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )
}

fn log_dir_from(xdg_state: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    match xdg_state {
        Some(state) if !state.as_os_str().is_empty() => Some(state.join("mycord")),
        _ => home.map(|home| home.join(".local/state/mycord")),
    }
}

/// Opens the log file in append mode, creating its directory as needed.
///
/// Returns `None` if any step fails, after warning on stderr.
fn create_log_file() -> Option<File> {
    let log_dir = log_dir()?;

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory {log_dir:?}: {e}");
        return None;
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Failed to open log file {log_path:?}: {e}");
            None
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` refines the default `mycord=info` filter.
pub fn init() {
    let Some(file) = create_log_file() else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .init();
        return;
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in ["mycord=info", "mycord_client=info", "mycord_protocol=info"] {
        // Constant directives; fall back to a plain level if one ever fails to parse
        filter = filter.add_directive(
            directive
                .parse()
                .unwrap_or_else(|_| Directive::from(tracing::Level::INFO)),
        );
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_prefers_xdg_state() {
        let dir = log_dir_from(Some("/tmp/state".into()), Some("/home/alice".into()));
        assert_eq!(dir, Some(PathBuf::from("/tmp/state/mycord")));
    }

    #[test]
    fn test_log_dir_falls_back_to_home() {
        let dir = log_dir_from(None, Some("/home/alice".into()));
        assert_eq!(dir, Some(PathBuf::from("/home/alice/.local/state/mycord")));

        let dir = log_dir_from(Some(PathBuf::new()), Some("/home/alice".into()));
        assert_eq!(dir, Some(PathBuf::from("/home/alice/.local/state/mycord")));
    }

    #[test]
    fn test_log_dir_none_without_home() {
        assert_eq!(log_dir_from(None, None), None);
    }
}

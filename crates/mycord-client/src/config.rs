//! Startup configuration for the client.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command-line arguments
//! 2. An optional TOML config file
//! 3. Built-in defaults (`127.0.0.1:8080`, highlighting on)
//!
//! The config file is looked up at `--config`, then `$MYCORD_CONFIG`, then
//! `<config dir>/mycord/config.toml`. Only the last one may be missing.

use std::env;
use std::fs;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Parser;
use mycord_core::{Username, DEFAULT_HOST, DEFAULT_PORT};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MYCORD_CONFIG";

// ============================================================================
// CLI Arguments
// ============================================================================

/// mycord client
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mycord")]
#[command(about = "mycord client")]
#[command(version)]
#[command(after_help = "examples:\n  \
    mycord --port 1738 (connects to a mycord server at 127.0.0.1:1738)\n  \
    mycord --domain example.com (connects to a mycord server at example.com:8080)")]
pub struct Args {
    /// port to connect to (default: 8080)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// IP to connect to (default: "127.0.0.1")
    #[arg(long, value_name = "IP", conflicts_with = "domain")]
    pub ip: Option<Ipv4Addr>,

    /// Domain name to connect to (if domain is specified, IP must not be)
    #[arg(long, value_name = "DOMAIN")]
    pub domain: Option<String>,

    /// do not perform alerts or mention highlighting
    #[arg(long)]
    pub quiet: bool,

    /// read settings from this TOML file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Config File
// ============================================================================

/// Contents of the optional TOML config file.
///
/// ```toml
/// host = "chat.example.com"   # IPv4 literal or domain name
/// port = 1738
/// quiet = false
/// username = "alice"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub quiet: Option<bool>,
    pub username: Option<String>,
}

impl FileConfig {
    /// Parses config file text.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConfigParse` for invalid TOML or unknown keys.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| ClientError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config file selected by `args` and the environment.
    ///
    /// Returns `Ok(None)` when no explicit file was requested and the default
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly requested file cannot be read, or if
    /// any file that is read fails to parse.
    pub fn load(args: &Args) -> Result<Option<Self>> {
        let explicit = args
            .config
            .clone()
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let (path, required) = match explicit {
            Some(path) => (path, true),
            None => match default_config_path() {
                Some(path) => (path, false),
                None => return Ok(None),
            },
        };

        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded config file");
                Self::parse(&text, &path).map(Some)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => Ok(None),
            Err(source) => Err(ClientError::ConfigRead { path, source }),
        }
    }
}

/// Returns `<config dir>/mycord/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mycord").join("config.toml"))
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Where the server lives before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerHost {
    /// IPv4 literal
    Ip(Ipv4Addr),
    /// Name to resolve to its first IPv4 address
    Domain(String),
}

impl ServerHost {
    fn from_config(host: &str) -> Self {
        match host.parse::<Ipv4Addr>() {
            Ok(ip) => Self::Ip(ip),
            Err(_) => Self::Domain(host.to_string()),
        }
    }
}

/// Merged client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: ServerHost,
    pub port: u16,
    pub quiet: bool,
    pub username: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: ServerHost::Ip(DEFAULT_HOST),
            port: DEFAULT_PORT,
            quiet: false,
            username: None,
        }
    }
}

impl ClientConfig {
    /// Merges command-line arguments over the config file over defaults.
    pub fn from_sources(args: &Args, file: Option<FileConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let host = match (args.ip, &args.domain) {
            (Some(ip), _) => ServerHost::Ip(ip),
            (None, Some(domain)) => ServerHost::Domain(domain.clone()),
            (None, None) => file
                .host
                .as_deref()
                .map(ServerHost::from_config)
                .unwrap_or(defaults.host),
        };

        Self {
            host,
            port: args.port.or(file.port).unwrap_or(defaults.port),
            quiet: args.quiet || file.quiet.unwrap_or(defaults.quiet),
            username: file.username,
        }
    }

    /// Resolves the server to a concrete IPv4 endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Resolve` if the lookup fails or yields no IPv4
    /// address.
    pub async fn resolve(&self) -> Result<SocketAddrV4> {
        match &self.host {
            ServerHost::Ip(ip) => Ok(SocketAddrV4::new(*ip, self.port)),
            ServerHost::Domain(domain) => {
                let addrs = tokio::net::lookup_host((domain.as_str(), self.port))
                    .await
                    .map_err(|e| ClientError::Resolve {
                        host: domain.clone(),
                        reason: e.to_string(),
                    })?;
                let addr = first_ipv4(addrs).ok_or_else(|| ClientError::Resolve {
                    host: domain.clone(),
                    reason: "no IPv4 address".to_string(),
                })?;
                info!(domain = %domain, addr = %addr, "Resolved server");
                Ok(addr)
            }
        }
    }
}

fn first_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddrV4> {
    addrs.into_iter().find_map(|addr| match addr {
        SocketAddr::V4(v4) => Some(v4),
        SocketAddr::V6(_) => None,
    })
}

// ============================================================================
// Username Discovery
// ============================================================================

/// Discovers the local username.
///
/// Tries the configured name, then `$USER`, then `$LOGNAME`, then the
/// output of `whoami`.
///
/// # Errors
///
/// Returns `ClientError::UsernameUnavailable` if every source is empty, or
/// `ClientError::Username` if the chosen name is unusable.
pub fn discover_username(configured: Option<&str>) -> Result<Username> {
    discover_username_with(configured, |key| env::var(key).ok(), run_whoami)
}

fn discover_username_with(
    configured: Option<&str>,
    env_lookup: impl Fn(&str) -> Option<String>,
    whoami: impl FnOnce() -> Option<String>,
) -> Result<Username> {
    let non_blank = |name: String| (!name.trim().is_empty()).then_some(name);
    let raw = configured
        .map(str::to_string)
        .and_then(non_blank)
        .or_else(|| env_lookup("USER").and_then(non_blank))
        .or_else(|| env_lookup("LOGNAME").and_then(non_blank))
        .or_else(|| whoami().and_then(non_blank))
        .ok_or(ClientError::UsernameUnavailable)?;

    let username = Username::new(&raw)?;
    debug!(username = %username, "Discovered username");
    Ok(username)
}

fn run_whoami() -> Option<String> {
    let output = Command::new("whoami").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

// ============================================================================
// Tests
// ============================================================================

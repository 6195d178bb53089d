//! Command-line flags and the connection configuration derived from them.

use std::path::{Path, PathBuf};

use getopts::Options;
use scylla::statement::Consistency;

use crate::errors::ConfigError;

/// Contact host used when `--host` is not given.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Native protocol port used when `--port` is not given.
pub const DEFAULT_PORT: &str = "9042";

/// Username and password presented to the cluster's password authenticator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything needed to open a session, built once at startup.
///
/// Empty strings stand for "not given", exactly as the flags default to.
/// Use the accessor methods rather than inspecting the raw fields when
/// deciding whether an optional piece is present.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Contact host.
    pub host: String,
    /// Native protocol port.
    pub port: String,
    /// Username, empty when absent.
    pub user: String,
    /// Password, empty when absent.
    pub password: String,
    /// Path to a PEM file holding one or more CA certificates.
    pub ca_cert_path: Option<PathBuf>,
    /// Path to a PEM file holding the client certificate chain.
    pub client_cert_path: Option<PathBuf>,
    /// Path to a PEM file holding the client private key.
    pub client_key_path: Option<PathBuf>,
    /// Whether to validate the server's certificate chain and name.
    pub verify_host: bool,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("ca_cert_path", &self.ca_cert_path)
            .field("client_cert_path", &self.client_cert_path)
            .field("client_key_path", &self.client_key_path)
            .field("verify_host", &self.verify_host)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT.to_owned(),
            user: String::new(),
            password: String::new(),
            ca_cert_path: None,
            client_cert_path: None,
            client_key_path: None,
            verify_host: false,
        }
    }
}

impl ConnectionConfig {
    /// `host:port`, as handed to the driver as the single known node.
    pub fn contact_point(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Credentials to authenticate with.
    ///
    /// Present only when both the username and the password are non-empty;
    /// otherwise the session is unauthenticated.
    pub fn credentials(&self) -> Option<Credentials> {
        if self.user.is_empty() || self.password.is_empty() {
            return None;
        }
        Some(Credentials {
            username: self.user.clone(),
            password: self.password.clone(),
        })
    }

    /// Paths of the client certificate and key, if both were given.
    ///
    /// A lone `--cert` or `--key` yields `None`.
    pub fn client_identity_paths(&self) -> Option<(&Path, &Path)> {
        match (&self.client_cert_path, &self.client_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }

    /// Consistency used for every statement. Not configurable.
    pub fn consistency(&self) -> Consistency {
        Consistency::Quorum
    }
}

/// What the command line asked the program to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect and run the shell.
    Run(ConnectionConfig),
    /// Print the given usage text and exit successfully.
    Help(String),
}

fn options() -> Options {
    let mut opts = Options::new();
    // Accept `-host` as well as `--host`.
    opts.long_only(true);
    opts.optopt("", "host", "Database host (default 127.0.0.1)", "HOST");
    opts.optopt("", "port", "Database port (default 9042)", "PORT");
    opts.optopt("", "user", "Username for authentication", "USER");
    opts.optopt("", "password", "Password for authentication", "PASSWORD");
    opts.optopt("", "ca", "Path to CA certificate", "PATH");
    opts.optopt("", "cert", "Path to client certificate", "PATH");
    opts.optopt("", "key", "Path to client key", "PATH");
    opts.optflag("", "verify", "Enable SSL host verification");
    opts.optflag("h", "help", "Print this help menu");
    opts
}

fn non_empty_path(value: Option<String>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Parses command-line arguments, excluding the program name.
pub fn parse_args<I, S>(program: &str, args: I) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let opts = options();
    let matches = opts.parse(args)?;

    if matches.opt_present("h") {
        let brief = format!("Usage: {program} [options]");
        return Ok(Command::Help(opts.usage(&brief)));
    }

    if !matches.free.is_empty() {
        return Err(ConfigError::UnexpectedArguments(matches.free));
    }

    let defaults = ConnectionConfig::default();
    Ok(Command::Run(ConnectionConfig {
        host: matches.opt_str("host").unwrap_or(defaults.host),
        port: matches.opt_str("port").unwrap_or(defaults.port),
        user: matches.opt_str("user").unwrap_or_default(),
        password: matches.opt_str("password").unwrap_or_default(),
        ca_cert_path: non_empty_path(matches.opt_str("ca")),
        client_cert_path: non_empty_path(matches.opt_str("cert")),
        client_key_path: non_empty_path(matches.opt_str("key")),
        verify_host: matches.opt_present("verify"),
    }))
}

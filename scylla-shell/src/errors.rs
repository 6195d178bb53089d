//! Errors produced by the shell.
//!
//! There are two tiers:
//! - startup errors ([ConfigError], [ConnectError]) abort the process
//!   before the first prompt is shown,
//! - per-query errors ([QueryError]) are reported and the loop goes on.

use std::path::PathBuf;

use scylla::errors::{DeserializationError, ExecutionError, NewSessionError};
use scylla::response::query_result::{IntoRowsResultError, RowsError};
use thiserror::Error;

/// Error assembling the connection configuration from command-line flags
/// and the certificate files they name.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Flags could not be parsed.
    #[error("Invalid command-line arguments: {0}")]
    InvalidArguments(#[from] getopts::Fail),

    /// Arguments that are not flags were passed.
    #[error("Unexpected positional arguments: {0:?}")]
    UnexpectedArguments(Vec<String>),

    /// The CA certificate file could not be read.
    #[error("Could not read CA certificate {path:?}: {source}")]
    ReadCaCertificate {
        /// Path passed with `--ca`.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CA certificate file is not valid PEM.
    #[error("Could not parse CA certificate {path:?}: {source}")]
    ParseCaCertificate {
        /// Path passed with `--ca`.
        path: PathBuf,
        /// Underlying PEM error.
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    /// The CA certificate file holds no certificate at all.
    #[error("Failed to append CA certificate: no PEM certificates found in {0:?}")]
    NoCaCertificates(PathBuf),

    /// A certificate from the CA file was rejected by the trust store.
    #[error("Failed to append CA certificate from {path:?}: {source}")]
    AddCaCertificate {
        /// Path passed with `--ca`.
        path: PathBuf,
        /// Error reported by rustls.
        #[source]
        source: rustls::Error,
    },

    /// The client certificate chain could not be loaded.
    #[error("Could not load client certificate {path:?}: {source}")]
    LoadClientCertificate {
        /// Path passed with `--cert`.
        path: PathBuf,
        /// Underlying PEM error.
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    /// The client certificate file holds no certificate at all.
    #[error("Could not load client certificate: no PEM certificates found in {0:?}")]
    NoClientCertificates(PathBuf),

    /// The client private key could not be loaded.
    #[error("Could not load client key {path:?}: {source}")]
    LoadClientKey {
        /// Path passed with `--key`.
        path: PathBuf,
        /// Underlying PEM error.
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    /// The client certificate and key were loaded but do not form a pair.
    #[error("Could not load client key pair: {0}")]
    InvalidClientKeyPair(#[source] rustls::Error),

    /// The server certificate verifier could not be built from the trust pool.
    #[error("Could not set up server certificate verification: {0}")]
    Verifier(#[source] rustls::client::VerifierBuilderError),

    /// rustls refused the assembled client configuration.
    #[error("Could not set up TLS: {0}")]
    Tls(#[source] rustls::Error),
}

/// Error opening the session to the cluster.
#[derive(Error, Debug)]
#[error("Could not connect to ScyllaDB at {contact_point}: {source}")]
pub struct ConnectError {
    /// `host:port` the session was pointed at.
    pub contact_point: String,
    /// Error reported by the driver.
    #[source]
    pub source: NewSessionError,
}

/// Error executing a single statement.
///
/// The session stays usable after any of these.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QueryError {
    /// The driver failed to execute the statement.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The response claimed to carry rows but its metadata was malformed.
    #[error(transparent)]
    ResultMetadata(#[from] IntoRowsResultError),

    /// Rows of the response could not be deserialized.
    #[error(transparent)]
    Rows(#[from] RowsError),

    /// A single row could not be deserialized.
    #[error("Failed to deserialize row: {0}")]
    Row(#[from] DeserializationError),
}

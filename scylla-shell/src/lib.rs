//! Interactive CQL shell for [ScyllaDB](https://scylladb.com), built on the Scylla Rust driver.
//!
//! The shell connects to a single contact point over TLS, reads CQL
//! statements line by line and prints each result as a fixed-width table.
//!
//! # Overview
//! * [config] turns command-line flags into a [ConnectionConfig].
//! * [tls] reads certificate material and builds the rustls client configuration.
//! * [session] opens the one driver [Session](scylla::client::session::Session) used
//!   for the whole run and exposes it through [QueryExecutor].
//! * [shell] runs the prompt loop, rendering results with [render] and [value].
//!
//! ```rust,no_run
//! use scylla_shell::config::{parse_args, Command};
//! use scylla_shell::shell::{PlainLines, Shell};
//! use scylla_shell::{session, tls};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let Command::Run(config) = parse_args("scylla-shell", ["-host", "10.0.0.1"])? else {
//!     return Ok(());
//! };
//! let session = session::connect(&config, tls::assemble(&config)?).await?;
//!
//! let mut input = PlainLines::new(std::io::stdin().lock(), std::io::stdout());
//! Shell::new(session, std::io::stdout(), std::io::stderr())
//!     .run(&mut input)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod render;
pub mod session;
pub mod shell;
pub mod tls;
pub mod value;

pub use config::ConnectionConfig;
pub use errors::{ConfigError, ConnectError, QueryError};
pub use session::{QueryExecutor, ResultPage, ShellSession};
pub use shell::{ExitReason, Shell};
pub use value::CellValue;

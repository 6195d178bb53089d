//! `scylla-shell` binary: connects to one ScyllaDB node and runs the CQL prompt.

use std::env;
use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use scylla_shell::config::{parse_args, Command};
use scylla_shell::shell::{EditorLines, LineReader, PlainLines, Shell};
use scylla_shell::{session, tls};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// Driver and shell diagnostics go to stderr, filtered by RUST_LOG:
// RUST_LOG=info scylla-shell -host 127.0.0.1
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "scylla-shell".to_owned());
    let config = match parse_args(&program, args)? {
        Command::Run(config) => config,
        Command::Help(usage) => {
            print!("{usage}");
            return Ok(());
        }
    };
    debug!(
        "Contact point {}, host verification {}",
        config.contact_point(),
        if config.verify_host { "on" } else { "off" }
    );

    let tls = tls::assemble(&config).context("Failed to set up TLS")?;
    let session = session::connect(&config, tls).await?;

    let mut input: Box<dyn LineReader> = if io::stdin().is_terminal() {
        Box::new(EditorLines::new().context("Failed to initialize line editor")?)
    } else {
        Box::new(PlainLines::new(io::stdin().lock(), io::stdout()))
    };

    let mut shell = Shell::new(session, io::stdout(), io::stderr());
    let reason = shell.run(&mut input).await?;
    info!("Shell finished: {reason:?}");
    Ok(())
}

//! Polls game servers and writes a JSON status report to standard output.
//!
//! Usage:
//!
//! ```text
//! wrangler_status [--config <path>] <host[:port]>...
//! ```
//!
//! Without `--config`, the `WRANGLER_CONFIG` environment variable names the
//! configuration file; when neither is set, defaults apply. Addresses
//! without a port use `status.default_game_port`. Unreachable servers are
//! reported inline and never fail the run.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use wrangler::config::{ConfigError, WranglerConfig};
use wrangler::status::{
    adapters::ServerListPingProbe,
    domain::{ParseServerAddressError, ServerAddress},
    services::StatusPoller,
};
use wrangler::telemetry::init_tracing;

const CONFIG_ENV: &str = "WRANGLER_CONFIG";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum StatusCliError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Address(#[from] ParseServerAddressError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("failed to write report: {0}")]
    Output(#[source] serde_json::Error),
}

#[derive(Debug, Default)]
struct StatusArgs {
    config_path: Option<PathBuf>,
    addresses: Vec<String>,
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let args = parse_args(env::args().skip(1))?;
    run(&args).map_err(Into::into)
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<StatusArgs, StatusCliError> {
    let mut parsed = StatusArgs::default();
    while let Some(arg) = raw.next() {
        if arg == "--config" {
            let path = raw
                .next()
                .ok_or_else(|| StatusCliError::InvalidArgs("--config requires a path".to_owned()))?;
            parsed.config_path = Some(PathBuf::from(path));
        } else {
            parsed.addresses.push(arg);
        }
    }
    if parsed.addresses.is_empty() {
        return Err(StatusCliError::InvalidArgs(
            "usage: wrangler_status [--config <path>] <host[:port]>...".to_owned(),
        ));
    }
    if parsed.config_path.is_none() {
        parsed.config_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
    }
    Ok(parsed)
}

fn run(args: &StatusArgs) -> Result<(), StatusCliError> {
    let config = match &args.config_path {
        Some(path) => WranglerConfig::from_json_file(path)?,
        None => WranglerConfig::default(),
    };
    let targets = args
        .addresses
        .iter()
        .map(|raw| ServerAddress::parse(raw, config.status.default_game_port))
        .collect::<Result<Vec<_>, _>>()?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StatusCliError::RuntimeInit)?;
    let poller = StatusPoller::new(
        Arc::new(ServerListPingProbe::default()),
        config.status.query_timeout(),
        config.status.max_concurrency,
    );
    let report = runtime.block_on(poller.poll_status(targets));

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).map_err(StatusCliError::Output)?;
    writeln!(stdout).map_err(|err| StatusCliError::Output(serde_json::Error::io(err)))?;
    Ok(())
}

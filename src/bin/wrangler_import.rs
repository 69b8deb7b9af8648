//! Imports popular catalogue modpacks as server types and prints a JSON
//! summary to standard output.
//!
//! Usage:
//!
//! ```text
//! wrangler_import [--config <path>] [--database-url <url>]
//! ```
//!
//! `WRANGLER_CONFIG` and `DATABASE_URL` supply the values when the flags are
//! absent. The database URL is required; configuration falls back to
//! defaults. Packs already registered under the same name and version are
//! reported as existing and left untouched.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use reqwest::Url;
use thiserror::Error;
use tokio::runtime::Builder;
use wrangler::config::{ConfigError, WranglerConfig};
use wrangler::hosting::{
    adapters::{FtbModpackSource, postgres::PostgresHostingRepository},
    domain::HostingDomainError,
    services::{ModpackImportError, ModpackImportService},
};
use wrangler::telemetry::init_tracing;

const CONFIG_ENV: &str = "WRANGLER_CONFIG";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const USAGE: &str = "usage: wrangler_import [--config <path>] [--database-url <url>]";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum ImportCliError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid import settings: {0}")]
    Settings(#[from] HostingDomainError),
    #[error("invalid catalogue url '{url}': {reason}")]
    CatalogueUrl { url: String, reason: String },
    #[error("failed to build catalogue client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to connect to the database: {0}")]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Import(#[from] ModpackImportError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("failed to write summary: {0}")]
    Output(#[source] serde_json::Error),
}

#[derive(Debug, PartialEq, Eq)]
struct ImportArgs {
    config_path: Option<PathBuf>,
    database_url: String,
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let args = parse_args(env::args().skip(1), |key| env::var(key).ok())?;
    run(&args).map_err(Into::into)
}

fn parse_args(
    mut raw: impl Iterator<Item = String>,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> Result<ImportArgs, ImportCliError> {
    let mut config_path = None;
    let mut database_url = None;
    while let Some(arg) = raw.next() {
        let slot = match arg.as_str() {
            "--config" => &mut config_path,
            "--database-url" => &mut database_url,
            _ => return Err(ImportCliError::InvalidArgs(USAGE.to_owned())),
        };
        let value = raw
            .next()
            .ok_or_else(|| ImportCliError::InvalidArgs(format!("{arg} requires a value")))?;
        *slot = Some(value);
    }

    let resolved_url = database_url
        .or_else(|| lookup_env(DATABASE_URL_ENV))
        .ok_or_else(|| {
            ImportCliError::InvalidArgs(format!("--database-url or {DATABASE_URL_ENV} is required"))
        })?;
    Ok(ImportArgs {
        config_path: config_path.or_else(|| lookup_env(CONFIG_ENV)).map(PathBuf::from),
        database_url: resolved_url,
    })
}

fn run(args: &ImportArgs) -> Result<(), ImportCliError> {
    let config = match &args.config_path {
        Some(path) => WranglerConfig::from_json_file(path)?,
        None => WranglerConfig::default(),
    };
    let settings = config.modpacks.import_settings()?;
    let base_url =
        Url::parse(&config.modpacks.base_url).map_err(|err| ImportCliError::CatalogueUrl {
            url: config.modpacks.base_url.clone(),
            reason: err.to_string(),
        })?;
    let source = FtbModpackSource::new(base_url, config.modpacks.request_timeout())
        .map_err(ImportCliError::Client)?;

    let manager = ConnectionManager::<PgConnection>::new(args.database_url.as_str());
    let pool = Pool::builder().build(manager)?;
    let service = ModpackImportService::new(
        Arc::new(PostgresHostingRepository::new(pool)),
        Arc::new(source),
        settings,
    );

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ImportCliError::RuntimeInit)?;
    let summary = runtime.block_on(service.import_popular())?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary).map_err(ImportCliError::Output)?;
    writeln!(stdout).map_err(|err| ImportCliError::Output(serde_json::Error::io(err)))?;
    Ok(())
}

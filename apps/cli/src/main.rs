mod args;
mod config;
mod dirs;
mod report;

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chart_core::ChartKind;
use chart_db::{Db, DbError, ResponseCache};
use ingest::{ChartApiClient, IngestError, RunFailure, RunSummary, run_chart};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_DB_FILE_NAME, EtlConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = args::parse_args().map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;

    let loaded = config::load_or_create(args.config.as_deref()).map_err(io::Error::other)?;
    if loaded.created {
        println!("Created config at {}.", loaded.file.display());
    }
    let mut config = loaded.config;
    config.apply_env();
    config
        .validate()
        .map_err(|err| io::Error::other(format!("{}: {}", loaded.file.display(), err)))?;

    let data_dir = dirs::data_dir().map_err(io::Error::other)?;
    fs::create_dir_all(&data_dir)?;
    let database_path = args
        .db
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| data_dir.join(DEFAULT_DB_FILE_NAME));

    let tables = if args.tables.is_empty() {
        config.tables.clone()
    } else {
        args.tables.clone()
    };
    let failed = run_tables(&tables, &config, &database_path, &data_dir);
    if failed > 0 {
        return Err(io::Error::other(format!(
            "{failed} of {} chart runs failed",
            tables.len()
        ))
        .into());
    }
    Ok(())
}

/// Why a table run ended early.
#[derive(Debug)]
enum TableError {
    /// Nothing was paged: the destination or the cache could not be opened.
    Setup(IngestError),
    Run(RunFailure),
}

impl TableError {
    fn partial_summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Setup(_) => None,
            Self::Run(failure) => Some(&failure.summary),
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(err) => write!(f, "{}", err),
            Self::Run(failure) => write!(f, "{}", failure),
        }
    }
}

impl From<DbError> for TableError {
    fn from(err: DbError) -> Self {
        Self::Setup(err.into())
    }
}

/// Runs every table on its own, so one failing chart does not keep the
/// others from loading. Returns how many runs failed.
fn run_tables(
    tables: &[ChartKind],
    config: &EtlConfig,
    database_path: &Path,
    data_dir: &Path,
) -> usize {
    let mut failed = 0;
    for &kind in tables {
        match run_table(kind, config, database_path, data_dir) {
            Ok(summary) => print!("{}", report::summary_report(&summary)),
            Err(err) => {
                error!(table = %kind, "chart run failed: {}", err);
                if let Some(summary) = err.partial_summary() {
                    print!("{}", report::summary_report(summary));
                }
                failed += 1;
            }
        }
    }
    failed
}

fn run_table(
    kind: ChartKind,
    config: &EtlConfig,
    database_path: &Path,
    data_dir: &Path,
) -> Result<RunSummary, TableError> {
    let db = Db::open(database_path).map_err(|err| {
        error!(path = %database_path.display(), "failed to get database connection: {}", err);
        err
    })?;
    info!(path = %database_path.display(), "connected to database");
    db.attach_schema(
        &config.schema,
        data_dir.join(format!("{}.sqlite", config.schema)),
    )?;

    let cache = ResponseCache::open(data_dir, &config.cache_namespace)?;
    let client = ChartApiClient::new(config.api_settings(), kind.shape(), cache);
    run_chart(db, client, &config.run_options(kind)).map_err(TableError::Run)
}

use std::thread;
use std::time::{Duration, Instant};

use chart_core::{ChartKind, RecordShape};
use chart_db::Db;
use chrono::Local;
use tracing::{info, warn};

use crate::client::PageSource;
use crate::parser::{chart_items, total_pages};
use crate::transform::{SeenIdentities, transform};
use crate::types::{IngestError, Result};

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(350);
/// Page count assumed until the first response reports the real one.
pub const DEFAULT_INITIAL_TOTAL_PAGES: u32 = 100;

/// Settings for a single chart run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub shape: &'static RecordShape,
    pub schema: String,
    /// Pause after every page that was not served from the response cache.
    pub rate_limit: Duration,
    pub initial_total_pages: u32,
}

impl RunOptions {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            shape: kind.shape(),
            schema: "main".to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            initial_total_pages: DEFAULT_INITIAL_TOTAL_PAGES,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A page produced no new rows.
    Exhausted,
    /// Every page reported by the API was requested.
    LastPage,
    /// The API answered with a non-200 status.
    ApiError { page: u32, status: u16 },
    /// A fatal error ended the run while `page` was being handled.
    Failed { page: u32 },
}

impl RunOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::ApiError { .. } | Self::Failed { .. })
    }
}

/// A batch the loader rejected. Its rows are not counted as added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedBatch {
    pub page: u32,
    pub rows: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub table: String,
    pub outcome: RunOutcome,
    pub rows_added: usize,
    pub pages_completed: u32,
    pub total_pages: u32,
    pub failed_batches: Vec<FailedBatch>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn elapsed_minutes(&self) -> f64 {
        (self.elapsed.as_secs_f64() / 60.0 * 100.0).round() / 100.0
    }

    pub fn failed_rows(&self) -> usize {
        self.failed_batches.iter().map(|batch| batch.rows).sum()
    }
}

struct RunState {
    page: u32,
    total_pages: u32,
    total_rows: usize,
    pages_completed: u32,
    failed_batches: Vec<FailedBatch>,
    seen: SeenIdentities,
}

impl RunState {
    fn new(initial_total_pages: u32) -> Self {
        Self {
            page: 1,
            total_pages: initial_total_pages.max(2),
            total_rows: 0,
            pages_completed: 0,
            failed_batches: Vec::new(),
            seen: SeenIdentities::new(),
        }
    }

    fn into_summary(self, table: &str, outcome: RunOutcome, elapsed: Duration) -> RunSummary {
        RunSummary {
            table: table.to_string(),
            outcome,
            rows_added: self.total_rows,
            pages_completed: self.pages_completed,
            total_pages: self.total_pages,
            failed_batches: self.failed_batches,
            elapsed,
        }
    }
}

/// A run that ended on a fatal error. `summary` still describes the rows
/// committed before the error.
#[derive(Debug)]
pub struct RunFailure {
    pub summary: RunSummary,
    pub error: IngestError,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} run failed: {}", self.summary.table, self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Pages through one chart and appends its new rows to the destination
/// table. The database connection and the page source are released when the
/// run ends, whichever way it ends.
pub fn run_chart<S: PageSource>(
    mut db: Db,
    mut source: S,
    options: &RunOptions,
) -> std::result::Result<RunSummary, RunFailure> {
    let started = Instant::now();
    let table = options.shape.table_name;
    let mut state = RunState::new(options.initial_total_pages);

    let result = page_through(&mut db, &mut source, options, &mut state);

    drop(source);
    if let Err(err) = db.close() {
        warn!(table, "failed to close database: {}", err);
    }

    let failed_page = state.page;
    let (outcome, error) = match result {
        Ok(outcome) => (outcome, None),
        Err(err) => (RunOutcome::Failed { page: failed_page }, Some(err)),
    };
    let summary = state.into_summary(table, outcome, started.elapsed());
    info!(
        table,
        rows_added = summary.rows_added,
        failed_batches = summary.failed_batches.len(),
        minutes = summary.elapsed_minutes(),
        "finished chart run"
    );
    match error {
        None => Ok(summary),
        Some(error) => Err(RunFailure { summary, error }),
    }
}

fn page_through<S: PageSource>(
    db: &mut Db,
    source: &mut S,
    options: &RunOptions,
    state: &mut RunState,
) -> Result<RunOutcome> {
    let shape = options.shape;
    let table = shape.table_name;
    if db.ensure_table(&options.schema, table)? {
        info!(schema = %options.schema, table, "created destination table");
    }

    loop {
        if state.page > state.total_pages {
            return Ok(RunOutcome::LastPage);
        }
        let response = source.fetch_page(state.page)?;
        if !response.is_ok() {
            warn!(
                table,
                page = state.page,
                status = response.status,
                body = %response.body,
                "chart API returned an error; stopping"
            );
            return Ok(RunOutcome::ApiError {
                page: state.page,
                status: response.status,
            });
        }

        let body = response.json()?;
        let items = chart_items(shape, &body)?;
        let rows = transform(shape, items, &mut state.seen, Local::now().date_naive())?;
        match db.load_rows(&options.schema, table, &rows) {
            Ok(0) => {
                info!(table, page = state.page, "no more data");
                return Ok(RunOutcome::Exhausted);
            }
            Ok(written) => {
                state.total_rows += written;
                info!(table, page = state.page, rows = written, "rows added");
            }
            Err(err) => {
                warn!(
                    table,
                    page = state.page,
                    rows = rows.len(),
                    "failed to load batch: {}",
                    err
                );
                state.failed_batches.push(FailedBatch {
                    page: state.page,
                    rows: rows.len(),
                    message: err.to_string(),
                });
            }
        }

        if let Some(reported) = total_pages(shape, &body) {
            state.total_pages = reported;
        }
        state.pages_completed += 1;
        info!(table, "requested page {}/{}", state.page, state.total_pages);

        if !response.from_cache && !options.rate_limit.is_zero() {
            thread::sleep(options.rate_limit);
        }
        state.page += 1;
    }
}

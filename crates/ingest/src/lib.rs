mod client;
mod parser;
mod pipeline;
mod transform;
mod types;

pub use client::{
    ApiSettings, ChartApiClient, DEFAULT_API_URL, DEFAULT_USER_AGENT, PageResponse, PageSource,
    request_url,
};
pub use parser::{chart_items, total_pages};
pub use pipeline::{
    DEFAULT_INITIAL_TOTAL_PAGES, DEFAULT_RATE_LIMIT, FailedBatch, RunFailure, RunOptions,
    RunOutcome, RunSummary, run_chart,
};
pub use transform::{SeenIdentities, coerce_integer, transform};
pub use types::{IngestError, Result};

use std::fmt::Write;

use ingest::{RunOutcome, RunSummary};

/// End-of-run report printed for every table, whichever way its run ended.
pub fn summary_report(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## FINISH ETL {} from LastFM API", summary.table);
    match summary.outcome {
        RunOutcome::ApiError { page, status } => {
            let _ = writeln!(out, "## Stopped at page {page}: API returned status {status}");
        }
        RunOutcome::Failed { page } => {
            let _ = writeln!(out, "## Stopped at page {page}: fatal error");
        }
        RunOutcome::Exhausted | RunOutcome::LastPage => {}
    }
    let _ = writeln!(out, "## {} rows were added", summary.rows_added);
    if !summary.failed_batches.is_empty() {
        let _ = writeln!(
            out,
            "## {} rows in {} failed batches were not loaded",
            summary.failed_rows(),
            summary.failed_batches.len()
        );
    }
    let _ = writeln!(out, "## Total runtime: {} minutes", summary.elapsed_minutes());
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ingest::FailedBatch;

    use super::*;

    fn summary(outcome: RunOutcome) -> RunSummary {
        RunSummary {
            table: "top_artists".to_string(),
            outcome,
            rows_added: 1000,
            pages_completed: 2,
            total_pages: 5,
            failed_batches: Vec::new(),
            elapsed: Duration::from_secs(90),
        }
    }

    #[test]
    fn exhausted_run_reports_rows_and_runtime() {
        assert_eq!(
            summary_report(&summary(RunOutcome::Exhausted)),
            "## FINISH ETL top_artists from LastFM API\n\
             ## 1000 rows were added\n\
             ## Total runtime: 1.5 minutes\n"
        );
    }

    #[test]
    fn api_error_names_page_and_status() {
        let report = summary_report(&summary(RunOutcome::ApiError {
            page: 3,
            status: 500,
        }));
        assert!(report.starts_with("## FINISH ETL top_artists from LastFM API\n"));
        assert!(report.contains("## Stopped at page 3: API returned status 500\n"));
        assert!(report.contains("## 1000 rows were added\n"));
        assert!(report.ends_with("## Total runtime: 1.5 minutes\n"));
    }

    #[test]
    fn failed_batches_are_counted() {
        let mut run = summary(RunOutcome::LastPage);
        run.failed_batches = vec![
            FailedBatch {
                page: 2,
                rows: 500,
                message: "disk full".to_string(),
            },
            FailedBatch {
                page: 4,
                rows: 120,
                message: "disk full".to_string(),
            },
        ];
        let report = summary_report(&run);
        assert!(report.contains("## 620 rows in 2 failed batches were not loaded\n"));
        assert!(!report.contains("Stopped at page"));
    }

    #[test]
    fn fatal_failure_still_reports_committed_rows() {
        let report = summary_report(&summary(RunOutcome::Failed { page: 3 }));
        assert!(report.contains("## Stopped at page 3: fatal error\n"));
        assert!(report.contains("## 1000 rows were added\n"));
    }
}

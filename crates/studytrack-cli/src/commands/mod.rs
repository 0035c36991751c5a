//! CLI subcommands and the helpers they share

pub mod assignments;
pub mod courses;
pub mod daemon;
pub mod refresh;
pub mod sessions;
pub mod status;
pub mod sync;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::json;

use studytrack_sync::SyncOutcome;

use crate::context::AppContext;
use crate::output::{OutputFormat, OutputFormatter};

/// Waits for queued edits to finish, then pushes them unless told not to
///
/// A failed or skipped sync is reported as a warning; the edits are
/// already saved locally either way.
pub(crate) async fn flush_edits(
    ctx: &AppContext,
    no_sync: bool,
    formatter: &dyn OutputFormatter,
) -> Result<Option<SyncOutcome>> {
    ctx.queue.wait_idle().await;

    if no_sync {
        return Ok(None);
    }
    if !ctx.has_access_token() {
        formatter.warn("No access token configured; changes are saved locally only");
        return Ok(None);
    }

    match ctx.orchestrator.perform_full_sync(false).await {
        Ok(outcome) => {
            if !outcome.is_completed() {
                formatter.warn(&format!("Sync {}; changes are saved locally", outcome.label()));
            }
            Ok(Some(outcome))
        }
        Err(e) => {
            formatter.warn(&format!("Sync failed ({e}); changes are saved locally"));
            Ok(None)
        }
    }
}

/// JSON rendering of a sync outcome
pub(crate) fn outcome_json(outcome: &SyncOutcome) -> serde_json::Value {
    match outcome {
        SyncOutcome::Completed(summary) => json!({
            "outcome": outcome.label(),
            "summary": summary,
        }),
        _ => json!({ "outcome": outcome.label() }),
    }
}

/// Prints the result of a queued edit
pub(crate) fn report_edit(
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
    message: &str,
    operation_id: impl std::fmt::Display,
    details: serde_json::Value,
    outcome: Option<SyncOutcome>,
) {
    if format.is_json() {
        formatter.print_json(&json!({
            "success": true,
            "message": message,
            "operation_id": operation_id.to_string(),
            "details": details,
            "sync": outcome.as_ref().map(outcome_json),
        }));
        return;
    }

    formatter.success(message);
    if let Some(SyncOutcome::Completed(summary)) = outcome {
        formatter.info(&format!("Synced at {}", summary.last_sync.to_rfc3339()));
    }
}

/// Parses `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp
pub(crate) fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    parse_date_at(value, NaiveTime::MIN)
}

/// Like [`parse_date`], but a bare date means the end of that day
pub(crate) fn parse_due(value: &str) -> Result<DateTime<Utc>, String> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    parse_date_at(value, end_of_day)
}

fn parse_date_at(value: &str, time: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(time).and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| format!("'{value}' is not a date (YYYY-MM-DD) or RFC 3339 timestamp"))
}

/// Grade column for human output
pub(crate) fn grade_label(grade: Option<f64>) -> String {
    grade.map_or_else(|| "-".to_string(), |g| format!("{g}"))
}

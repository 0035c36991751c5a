//! Sync command - Push local changes and pull the server state
//!
//! Provides the `studytrack sync` CLI command which:
//! 1. Wires the local store, device cipher and HTTP gateway
//! 2. Runs one user-priority full sync
//! 3. Reports the outcome (completed, skipped or aborted)

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use studytrack_core::config::Config;
use studytrack_sync::SyncOutcome;

use super::outcome_json;
use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let ctx = AppContext::open(config).await?;
        if !ctx.has_access_token() {
            formatter.error(
                "No access token configured. Set api.access_token in the config file or STUDYTRACK_TOKEN.",
            );
            return Ok(());
        }

        formatter.info("Starting synchronization...");
        let outcome = ctx
            .orchestrator
            .perform_full_sync(false)
            .await
            .context("Sync failed")?;
        info!(outcome = outcome.label(), "Sync command finished");

        if format.is_json() {
            formatter.print_json(&outcome_json(&outcome));
            return Ok(());
        }

        match outcome {
            SyncOutcome::Completed(summary) => {
                formatter.success("Sync completed");
                if let Some(count) = summary.assignments {
                    formatter.field("Assignments", &count.to_string());
                }
                if let Some(count) = summary.courses {
                    formatter.field("Courses", &count.to_string());
                }
                if let Some(count) = summary.study_sessions {
                    formatter.field("Study sessions", &count.to_string());
                }
                if summary.deletions_acknowledged > 0 {
                    formatter.field(
                        "Deletions sent",
                        &summary.deletions_acknowledged.to_string(),
                    );
                }
                formatter.field("Last sync", &summary.last_sync.to_rfc3339());
            }
            SyncOutcome::Skipped => {
                formatter.warn("Another sync is in progress; nothing was sent");
            }
            SyncOutcome::Aborted => {
                formatter.warn("Sync was interrupted; nothing was written");
            }
        }
        Ok(())
    }
}

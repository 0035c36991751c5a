//! Refresh command - Replace local data with the server snapshot

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use studytrack_core::config::Config;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct RefreshCommand {}

impl RefreshCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let ctx = AppContext::open(config).await?;
        if !ctx.has_access_token() {
            formatter.error(
                "No access token configured. Set api.access_token in the config file or STUDYTRACK_TOKEN.",
            );
            return Ok(());
        }

        let snapshot = ctx
            .orchestrator
            .refresh_all_data()
            .await
            .context("Refresh failed")?;

        if format.is_json() {
            formatter.print_json(&json!({
                "assignments": snapshot.assignments.len(),
                "courses": snapshot.courses.len(),
                "study_sessions": snapshot.study_sessions.len(),
            }));
        } else {
            formatter.success("Local data replaced with the server copy");
            formatter.field("Assignments", &snapshot.assignments.len().to_string());
            formatter.field("Courses", &snapshot.courses.len().to_string());
            formatter.field("Study sessions", &snapshot.study_sessions.len().to_string());
        }
        Ok(())
    }
}

//! Status command - Display local data and sync status
//!
//! Reads only the local store: no keyring access and no network.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde_json::json;

use studytrack_core::config::Config;

use crate::context::open_local;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let local = open_local(config).await?;
        let snapshot = local.read_snapshot().await;
        let metadata = local.read_metadata().await;

        let now = Utc::now();
        let pending = snapshot.pending_assignments().len();
        let overdue = snapshot.overdue_assignments(now).len();
        let token_configured = config.resolve_access_token().is_some();

        if format.is_json() {
            formatter.print_json(&json!({
                "server": config.api.base_url,
                "access_token_configured": token_configured,
                "database": config.storage.database.display().to_string(),
                "namespace": config.storage.namespace,
                "last_sync": metadata.last_sync.map(|t| t.to_rfc3339()),
                "pending_deletions": metadata.deleted_assignment_ids.len(),
                "assignments": {
                    "total": snapshot.assignments.len(),
                    "pending": pending,
                    "overdue": overdue,
                },
                "courses": snapshot.courses.len(),
                "study_sessions": snapshot.study_sessions.len(),
            }));
            return Ok(());
        }

        formatter.info("StudyTrack status");
        formatter.field("Server", &config.api.base_url);
        formatter.field(
            "Access token",
            if token_configured { "configured" } else { "missing" },
        );
        formatter.field(
            "Last sync",
            &metadata
                .last_sync
                .map_or_else(|| "never".to_string(), |t| t.to_rfc3339()),
        );
        formatter.field(
            "Pending deletions",
            &metadata.deleted_assignment_ids.len().to_string(),
        );
        formatter.field(
            "Assignments",
            &format!(
                "{} ({pending} pending, {overdue} overdue)",
                snapshot.assignments.len()
            ),
        );
        formatter.field("Courses", &snapshot.courses.len().to_string());
        formatter.field("Study sessions", &snapshot.study_sessions.len().to_string());

        if !token_configured {
            formatter.warn("No access token configured; changes stay on this device");
        }
        Ok(())
    }
}

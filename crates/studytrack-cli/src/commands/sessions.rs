//! Study session commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde_json::json;

use studytrack_core::config::Config;
use studytrack_core::domain::{StudySession, SyncId};

use super::{flush_edits, parse_date, report_edit};
use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// Record a study session
    Add(AddSessionArgs),
}

#[derive(Debug, Args)]
pub struct AddSessionArgs {
    /// Sync ID of the course studied
    #[arg(long)]
    pub course: SyncId,
    /// Length of the session in minutes
    #[arg(long)]
    pub minutes: u32,
    /// When the session took place (defaults to now)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<DateTime<Utc>>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Save locally without syncing
    #[arg(long)]
    pub no_sync: bool,
}

impl SessionsCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        match self {
            SessionsCommand::Add(args) => add(args, config, format).await,
        }
    }
}

async fn add(args: &AddSessionArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    let date = args.date.unwrap_or_else(Utc::now);
    let mut session = StudySession::new(args.course.clone(), date, args.minutes)
        .context("Invalid study session")?;
    if let Some(notes) = &args.notes {
        session = session.with_notes(notes.clone());
    }
    let id = session.id.clone();

    let ctx = AppContext::open(config).await?;
    let operation = ctx.tracker().add_study_session(session);
    let outcome = flush_edits(&ctx, args.no_sync, &*formatter).await?;

    report_edit(
        format,
        &*formatter,
        &format!("Study session recorded ({} min)", args.minutes),
        operation,
        json!({ "id": id, "course": args.course, "minutes": args.minutes }),
        outcome,
    );
    Ok(())
}

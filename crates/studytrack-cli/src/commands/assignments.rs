//! Assignment commands
//!
//! `list` reads the local store directly. Every other subcommand queues an
//! edit through the tracker, waits for the queue to drain and then runs a
//! full sync unless `--no-sync` is given.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde_json::json;

use studytrack_core::config::Config;
use studytrack_core::domain::{Assignment, SyncId};

use super::{flush_edits, grade_label, parse_due, report_edit};
use crate::context::{open_local, AppContext};
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum AssignmentsCommand {
    /// List assignments
    List(ListArgs),
    /// Add an assignment to a course
    Add(AddArgs),
    /// Set or clear an assignment's grade
    Grade(GradeArgs),
    /// Mark an assignment as done (or not done with --undo)
    Complete(CompleteArgs),
    /// Delete an assignment
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only assignments of this course
    #[arg(long)]
    pub course: Option<SyncId>,
    /// Only assignments not yet completed, soonest due first
    #[arg(long)]
    pub pending: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Sync ID of the course
    #[arg(long)]
    pub course: SyncId,
    #[arg(long)]
    pub title: String,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_due)]
    pub due: DateTime<Utc>,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Save locally without syncing
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Debug, Args)]
pub struct GradeArgs {
    pub id: SyncId,
    /// Numeric grade
    #[arg(required_unless_present = "clear")]
    pub grade: Option<f64>,
    /// Remove the grade instead
    #[arg(long, conflicts_with = "grade")]
    pub clear: bool,
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    pub id: SyncId,
    /// Mark as not done
    #[arg(long)]
    pub undo: bool,
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub id: SyncId,
    #[arg(long)]
    pub no_sync: bool,
}

impl AssignmentsCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        match self {
            AssignmentsCommand::List(args) => list(args, config, format, &*formatter).await,
            AssignmentsCommand::Add(args) => add(args, config, format, &*formatter).await,
            AssignmentsCommand::Grade(args) => grade(args, config, format, &*formatter).await,
            AssignmentsCommand::Complete(args) => {
                complete(args, config, format, &*formatter).await
            }
            AssignmentsCommand::Remove(args) => remove(args, config, format, &*formatter).await,
        }
    }
}

async fn list(
    args: &ListArgs,
    config: &Config,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let snapshot = open_local(config).await?.read_snapshot().await;

    let mut assignments: Vec<&Assignment> = if args.pending {
        snapshot.pending_assignments()
    } else {
        snapshot.assignments.iter().collect()
    };
    if let Some(course) = &args.course {
        assignments.retain(|a| &a.course_id == course);
    }

    if format.is_json() {
        formatter.print_json(&serde_json::to_value(&assignments)?);
        return Ok(());
    }

    if assignments.is_empty() {
        formatter.info("No assignments");
        return Ok(());
    }

    let now = Utc::now();
    for assignment in assignments {
        let course = snapshot
            .find_course(&assignment.course_id)
            .map_or("unknown course", |c| c.name.as_str());
        let marker = if assignment.completed {
            "x"
        } else if assignment.is_overdue(now) {
            "!"
        } else {
            " "
        };
        formatter.info(&format!(
            "[{marker}] {} ({course}) due {} grade {}  {}",
            assignment.title,
            assignment.due_date.format("%Y-%m-%d"),
            grade_label(assignment.numeric_grade()),
            assignment.id,
        ));
    }
    Ok(())
}

async fn add(
    args: &AddArgs,
    config: &Config,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if ctx
        .orchestrator
        .get_local_data()
        .await
        .find_course(&args.course)
        .is_none()
    {
        formatter.warn(&format!("Course {} is not known locally", args.course));
    }

    let assignment = Assignment::new(args.title.clone(), args.course.clone(), args.due)
        .with_description(args.description.clone());
    let id = assignment.id.clone();

    let operation = ctx.tracker().add_assignment(assignment);
    let outcome = flush_edits(&ctx, args.no_sync, formatter).await?;

    report_edit(
        format,
        formatter,
        &format!("Assignment added ({id})"),
        operation,
        json!({ "id": id }),
        outcome,
    );
    Ok(())
}

/// Opens the sync stack after checking that `id` exists locally
async fn open_for(
    id: &SyncId,
    config: &Config,
    formatter: &dyn OutputFormatter,
) -> Result<Option<AppContext>> {
    let ctx = AppContext::open(config).await?;
    let exists = ctx
        .orchestrator
        .get_local_data()
        .await
        .find_assignment(id)
        .is_some();
    if !exists {
        formatter.error(&format!("Assignment {id} not found"));
        return Ok(None);
    }
    Ok(Some(ctx))
}

async fn grade(
    args: &GradeArgs,
    config: &Config,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let grade = if args.clear { None } else { args.grade };
    if let Some(value) = grade {
        if !value.is_finite() || value < 0.0 {
            formatter.error(&format!("Invalid grade {value}: must be a non-negative number"));
            return Ok(());
        }
    }

    let Some(ctx) = open_for(&args.id, config, formatter).await? else {
        return Ok(());
    };
    let operation = ctx.tracker().set_assignment_grade(args.id.clone(), grade);
    let outcome = flush_edits(&ctx, args.no_sync, formatter).await?;

    let message = match grade {
        Some(value) => format!("Grade {value} recorded"),
        None => "Grade cleared".to_string(),
    };
    report_edit(
        format,
        formatter,
        &message,
        operation,
        json!({ "id": args.id, "grade": grade }),
        outcome,
    );
    Ok(())
}

async fn complete(
    args: &CompleteArgs,
    config: &Config,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let Some(ctx) = open_for(&args.id, config, formatter).await? else {
        return Ok(());
    };
    let completed = !args.undo;
    let operation = ctx.tracker().complete_assignment(args.id.clone(), completed);
    let outcome = flush_edits(&ctx, args.no_sync, formatter).await?;

    let message = if completed {
        "Assignment marked as done"
    } else {
        "Assignment marked as not done"
    };
    report_edit(
        format,
        formatter,
        message,
        operation,
        json!({ "id": args.id, "completed": completed }),
        outcome,
    );
    Ok(())
}

async fn remove(
    args: &RemoveArgs,
    config: &Config,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let Some(ctx) = open_for(&args.id, config, formatter).await? else {
        return Ok(());
    };
    let operation = ctx.tracker().remove_assignment(args.id.clone());
    let outcome = flush_edits(&ctx, args.no_sync, formatter).await?;

    report_edit(
        format,
        formatter,
        "Assignment removed",
        operation,
        json!({ "id": args.id }),
        outcome,
    );
    Ok(())
}

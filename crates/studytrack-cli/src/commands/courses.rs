//! Course commands

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::json;

use studytrack_core::config::Config;
use studytrack_core::domain::Course;

use super::{flush_edits, grade_label, report_edit};
use crate::context::{open_local, AppContext};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum CoursesCommand {
    /// List courses with their grade and study time
    List,
    /// Add a course
    Add(AddCourseArgs),
}

#[derive(Debug, Args)]
pub struct AddCourseArgs {
    pub name: String,
    /// Current grade, also recorded in the grade history
    #[arg(long)]
    pub grade: Option<f64>,
    /// Save locally without syncing
    #[arg(long)]
    pub no_sync: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        match self {
            CoursesCommand::List => list(config, format).await,
            CoursesCommand::Add(args) => add(args, config, format).await,
        }
    }
}

async fn list(config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let snapshot = open_local(config).await?.read_snapshot().await;

    if format.is_json() {
        let courses: Vec<_> = snapshot
            .courses
            .iter()
            .map(|course| {
                json!({
                    "course": course,
                    "assignments": snapshot.assignments_for_course(&course.id).count(),
                    "study_minutes": snapshot.total_study_minutes(&course.id),
                })
            })
            .collect();
        formatter.print_json(&json!(courses));
        return Ok(());
    }

    if snapshot.courses.is_empty() {
        formatter.info("No courses");
        return Ok(());
    }

    for course in &snapshot.courses {
        formatter.info(&format!(
            "{}  grade {}  {} assignments  {} min studied  {}",
            course.name,
            grade_label(course.numeric_grade()),
            snapshot.assignments_for_course(&course.id).count(),
            snapshot.total_study_minutes(&course.id),
            course.id,
        ));
    }
    Ok(())
}

async fn add(args: &AddCourseArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    let mut course = Course::new(args.name.clone());
    if let Some(grade) = args.grade {
        course
            .record_grade(Utc::now(), grade)
            .with_context(|| format!("Invalid grade {grade}"))?;
    }
    let id = course.id.clone();

    let ctx = AppContext::open(config).await?;
    let operation = ctx.tracker().add_course(course);
    let outcome = flush_edits(&ctx, args.no_sync, &*formatter).await?;

    report_edit(
        format,
        &*formatter,
        &format!("Course added ({id})"),
        operation,
        json!({ "id": id }),
        outcome,
    );
    Ok(())
}

//! Reporting commands: `report`, `stats`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use readiness_core::model::ProgressStatus;
use readiness_core::statistics::{learner_summary, module_stats};
use readiness_core::traits::{AttemptStore, CatalogStore, ProgressStore};
use readiness_core::CoreError;

use super::{Identity, Workspace};

pub async fn execute(
    identity: Identity,
    format: String,
    output: PathBuf,
    config: Option<&Path>,
) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;

    let records = session
        .services
        .ledger
        .progress_for_learner(&learner.id)
        .await?;
    let summary = learner_summary(
        &learner,
        &session.store().catalog().modules,
        &records,
        Utc::now(),
    );

    match format.as_str() {
        "html" => readiness_report::html::write_html_report(&summary, &output)?,
        "markdown" | "md" => readiness_report::markdown::write_markdown_report(&summary, &output)?,
        other => anyhow::bail!("unknown report format: {other} (expected html or markdown)"),
    }

    println!(
        "{} modules, {:.0}% overall, {} certification(s)",
        summary.rows.len(),
        summary.overall_percentage,
        summary.certifications.len()
    );
    println!("Report written to {}", output.display());
    Ok(())
}

pub async fn stats(module: String, config: Option<&Path>) -> Result<()> {
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let store = session.store();

    if store.module(&module).await?.is_none() {
        return Err(CoreError::not_found("module", &module).into());
    }

    let records = store.progress_for_module(&module).await?;
    let mut attempts = Vec::new();
    for assessment in store.assessments_for_module(&module).await? {
        attempts.extend(store.attempts_for_assessment(&assessment.id).await?);
    }
    let stats = module_stats(&module, &records, &attempts);

    println!("Module {}: {} learner(s)", stats.module_id, stats.learners);

    let mut table = Table::new();
    table.set_header(vec!["Status", "Learners"]);
    for status in [
        ProgressStatus::NotStarted,
        ProgressStatus::InProgress,
        ProgressStatus::Completed,
        ProgressStatus::Certified,
    ] {
        let count = stats.per_status.get(&status).copied().unwrap_or(0);
        table.add_row(vec![Cell::new(status), Cell::new(count)]);
    }
    println!("{table}");

    if let Some(avg) = stats.average_score {
        println!("Average score: {avg:.1}");
    }
    match stats.pass_rate {
        Some(rate) => println!(
            "Attempts: {} ({} passed, {:.1}% pass rate)",
            stats.attempts,
            stats.attempts_passed,
            rate * 100.0
        ),
        None => println!("Attempts: {}", stats.attempts),
    }
    Ok(())
}

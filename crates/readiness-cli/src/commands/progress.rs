//! Progress commands: `start`, `activity`, `complete`, `progress`.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use readiness_core::model::ProgressRecord;

use super::{Identity, Workspace};

pub async fn start(identity: Identity, module: String, config: Option<&Path>) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let record = session
        .services
        .ledger
        .start_module(&learner.id, &module, Utc::now())
        .await?;
    session.save()?;

    println!("{}: {}", record.module_id, record.status);
    Ok(())
}

pub async fn activity(
    identity: Identity,
    module: String,
    percent: f64,
    minutes: u32,
    config: Option<&Path>,
) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let record = session
        .services
        .ledger
        .record_activity(&learner.id, &module, percent, minutes)
        .await?;
    session.save()?;

    println!(
        "{}: {:.0}% ({} min total)",
        record.module_id, record.progress_percentage, record.time_spent_minutes
    );
    Ok(())
}

pub async fn complete(
    identity: Identity,
    module: String,
    score: Option<f64>,
    config: Option<&Path>,
) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let record = session
        .services
        .ledger
        .record_completion(&learner.id, &module, score, Utc::now())
        .await?;
    session.save()?;

    println!("{}: {}", record.module_id, record.status);
    Ok(())
}

pub async fn show(identity: Identity, module: Option<String>, config: Option<&Path>) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let ledger = &session.services.ledger;

    let records = match module {
        Some(module) => vec![ledger.get_progress(&learner.id, &module).await?],
        None => ledger.progress_for_learner(&learner.id).await?,
    };

    if records.is_empty() {
        println!("No progress recorded for {}.", learner.id);
        return Ok(());
    }
    println!("{}", progress_table(&records));
    Ok(())
}

fn progress_table(records: &[ProgressRecord]) -> Table {
    let date = |d: Option<chrono::DateTime<Utc>>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into())
    };

    let mut table = Table::new();
    table.set_header(vec![
        "Module",
        "Status",
        "Progress",
        "Minutes",
        "Score",
        "Started",
        "Completed",
        "Certified",
    ]);
    for r in records {
        table.add_row(vec![
            Cell::new(&r.module_id),
            Cell::new(r.status),
            Cell::new(format!("{:.0}%", r.progress_percentage)),
            Cell::new(r.time_spent_minutes),
            Cell::new(
                r.score
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(date(r.started_at)),
            Cell::new(date(r.completed_at)),
            Cell::new(date(r.certification_date)),
        ]);
    }
    table
}

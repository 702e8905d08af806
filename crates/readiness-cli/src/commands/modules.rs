//! The `readiness modules` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use readiness_core::eligibility::{classify_audience, eligible_modules};

use super::{Identity, Workspace};

pub async fn execute(identity: Identity, config: Option<&Path>) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let catalog = session.store().catalog();

    let modules = eligible_modules(&session.services.ledger, &learner, &catalog.modules).await?;

    println!(
        "{} modules for {} ({} audience)",
        modules.len(),
        learner.id,
        classify_audience(&learner)
    );
    if modules.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Module",
        "Title",
        "Type",
        "Minutes",
        "Status",
        "Progress",
        "Assessment",
    ]);
    for entry in &modules {
        let module = &entry.module;
        let assessment = catalog
            .assessment_for_module(&module.id)
            .map(|a| a.id.clone())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(&module.id),
            Cell::new(&module.title),
            Cell::new(module.content_type),
            Cell::new(
                module
                    .duration_minutes
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(entry.progress.status),
            Cell::new(format!("{:.0}%", entry.progress.progress_percentage)),
            Cell::new(assessment),
        ]);
    }
    println!("{table}");

    Ok(())
}

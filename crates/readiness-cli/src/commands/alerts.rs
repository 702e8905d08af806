//! Alert commands: `alerts`, `retract`.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use readiness_core::alerts::{poll_alerts, retract_alert, urgent_alerts};

use super::{Identity, Workspace};

pub async fn list(identity: Identity, urgent: bool, config: Option<&Path>) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;

    let mut alerts = poll_alerts(session.store(), &learner, Utc::now()).await?;
    if urgent {
        alerts = urgent_alerts(&alerts);
    }

    if alerts.is_empty() {
        println!("No active alerts for {}.", learner.id);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Alert", "Severity", "Title", "Message", "Posted", "Expires"]);
    for alert in &alerts {
        table.add_row(vec![
            Cell::new(&alert.id),
            Cell::new(alert.severity),
            Cell::new(&alert.title),
            Cell::new(&alert.message),
            Cell::new(alert.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(
                alert
                    .expires_at
                    .map(|e| e.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn retract(identity: Identity, alert: String, config: Option<&Path>) -> Result<()> {
    let actor = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;

    let retracted = retract_alert(session.store(), &actor, &alert).await?;
    session.save()?;

    println!("Alert {} retracted.", retracted.id);
    Ok(())
}

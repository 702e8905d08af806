//! The `readiness validate` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use readiness_core::parser::{load_catalog, validate_catalog};

pub fn execute(catalog_path: Option<PathBuf>, config: Option<&Path>) -> Result<()> {
    let catalog_path = match catalog_path {
        Some(path) => path,
        None => readiness_store::load_config_from(config)?.catalog_path,
    };

    let catalog = load_catalog(&catalog_path)?;
    println!(
        "Catalog: {} ({} modules, {} assessments, {} alerts, {} protocols)",
        catalog_path.display(),
        catalog.modules.len(),
        catalog.assessments.len(),
        catalog.alerts.len(),
        catalog.protocols.len()
    );

    let warnings = validate_catalog(&catalog);
    for w in &warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Catalog valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}

//! Markdown summary output, suitable for pasting into a school newsletter
//! or an issue tracker.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use readiness_core::model::ProgressStatus;
use readiness_core::statistics::LearnerSummary;

/// Pipes would break the table layout.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Render a learner summary as GitHub-flavored markdown.
pub fn to_markdown(summary: &LearnerSummary) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Preparedness progress: {}", cell(&summary.learner_id));
    md.push('\n');
    let _ = writeln!(
        md,
        "Generated {} | overall {:.0}% | {} certified, {} completed, {} in progress",
        summary.generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary.overall_percentage,
        summary.count_with_status(ProgressStatus::Certified),
        summary.count_with_status(ProgressStatus::Completed),
        summary.count_with_status(ProgressStatus::InProgress),
    );
    md.push('\n');

    md.push_str("## Modules\n\n");
    if summary.rows.is_empty() {
        md.push_str("_No modules available yet._\n");
    } else {
        md.push_str("| Module | Status | Progress | Score |\n");
        md.push_str("|---|---|---:|---:|\n");
        for row in &summary.rows {
            let score = row
                .score
                .map(|s| format!("{s:.1}"))
                .unwrap_or_else(|| "-".into());
            let _ = writeln!(
                md,
                "| {} | {} | {:.0}% | {} |",
                cell(&row.title),
                row.status,
                row.progress_percentage,
                score
            );
        }
    }

    if !summary.certifications.is_empty() {
        md.push_str("\n## Certifications\n\n");
        for cert in &summary.certifications {
            let _ = writeln!(
                md,
                "- **{}** ({})",
                cell(&cert.title),
                cert.certified_at.format("%Y-%m-%d")
            );
        }
    }

    md
}

/// Write a markdown summary to a file.
pub fn write_markdown_report(summary: &LearnerSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_markdown(summary))?;
    Ok(())
}

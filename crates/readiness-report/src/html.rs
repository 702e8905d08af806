//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use readiness_core::model::ProgressStatus;
use readiness_core::statistics::{LearnerSummary, ModuleRow};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn status_class(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::NotStarted => "not-started",
        ProgressStatus::InProgress => "in-progress",
        ProgressStatus::Completed => "completed",
        ProgressStatus::Certified => "certified",
    }
}

/// Generate an HTML progress report for one learner.
pub fn generate_html(summary: &LearnerSummary) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>readiness progress: {}</title>\n",
        html_escape(&summary.learner_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>Preparedness progress</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Learner: <strong>{}</strong> | {} modules | {:.0}% overall | {}</p>\n",
        html_escape(&summary.learner_id),
        summary.rows.len(),
        summary.overall_percentage,
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"modules\">\n");
    html.push_str("<h2>Module Progress</h2>\n");
    if summary.rows.is_empty() {
        html.push_str("<p>No modules available yet.</p>\n");
    } else {
        html.push_str(&generate_bar_chart(&summary.rows));
        html.push_str("<table>\n");
        html.push_str(
            "<thead><tr><th>Module</th><th>Status</th><th>Progress</th><th>Score</th></tr></thead>\n",
        );
        html.push_str("<tbody>\n");
        for row in &summary.rows {
            let score = row
                .score
                .map(|s| format!("{s:.1}%"))
                .unwrap_or_else(|| "-".to_string());
            html.push_str(&format!(
                "<tr><td>{}</td><td class=\"{}\">{}</td><td>{:.0}%</td><td>{}</td></tr>\n",
                html_escape(&row.title),
                status_class(row.status),
                row.status,
                row.progress_percentage,
                score
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"certifications\">\n");
    html.push_str("<h2>Certifications</h2>\n");
    if summary.certifications.is_empty() {
        html.push_str("<p>No certifications earned yet.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for cert in &summary.certifications {
            html.push_str(&format!(
                "<li><strong>{}</strong> earned on {}</li>\n",
                html_escape(&cert.title),
                cert.certified_at.format("%Y-%m-%d")
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(summary)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(summary: &LearnerSummary, path: &Path) -> Result<()> {
    let html = generate_html(summary);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(rows: &[ModuleRow]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 10;
    let label_width = 220;

    let total_height = rows.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, row) in rows.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let fraction = row.progress_percentage / 100.0;
        let width = (fraction * max_width as f64) as usize;

        let color = match row.status {
            ProgressStatus::Certified => "#22c55e",
            ProgressStatus::Completed => "#3b82f6",
            ProgressStatus::InProgress => "#eab308",
            ProgressStatus::NotStarted => "#9ca3af",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&row.title)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.0}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            row.progress_percentage
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --done: #dcfce7; --open: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --done: #064e3b; --open: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.certified, .completed { background: var(--done); }
.in-progress { background: var(--open); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use readiness_core::statistics::Certification;

    fn make_summary() -> LearnerSummary {
        let at = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
        LearnerSummary {
            learner_id: "s-42".into(),
            generated_at: at,
            rows: vec![
                ModuleRow {
                    module_id: "fire".into(),
                    title: "Fire <Safety>".into(),
                    status: ProgressStatus::Certified,
                    progress_percentage: 100.0,
                    score: Some(95.0),
                },
                ModuleRow {
                    module_id: "flood".into(),
                    title: "Flood Preparedness".into(),
                    status: ProgressStatus::InProgress,
                    progress_percentage: 60.0,
                    score: None,
                },
            ],
            overall_percentage: 80.0,
            certifications: vec![Certification {
                module_id: "fire".into(),
                title: "Fire <Safety>".into(),
                certified_at: at,
            }],
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_summary());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("s-42"));
        assert!(html.contains("Flood Preparedness"));
        assert!(html.contains("95.0%"));
        assert!(html.contains("earned on 2026-09-01"));
        assert!(html.contains("Fire &lt;Safety&gt;"));
        assert!(!html.contains("Fire <Safety>"));
    }

    #[test]
    fn html_report_empty_summary() {
        let mut summary = make_summary();
        summary.rows.clear();
        summary.certifications.clear();
        let html = generate_html(&summary);
        assert!(html.contains("No modules available yet."));
        assert!(html.contains("No certifications earned yet."));
    }

    #[test]
    fn html_report_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("progress.html");

        write_html_report(&make_summary(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}

//! TOML catalog parser.
//!
//! Loads modules, assessments, alerts, and emergency protocols from TOML
//! files and directories, and validates them. Timestamps are RFC 3339
//! strings (`created_at = "2026-10-01T08:00:00Z"`).

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Alert, Assessment, Catalog, EmergencyProtocol, Module};

/// Intermediate TOML structure for catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    modules: Vec<Module>,
    #[serde(default)]
    assessments: Vec<Assessment>,
    #[serde(default)]
    alerts: Vec<Alert>,
    #[serde(default)]
    protocols: Vec<EmergencyProtocol>,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Catalog {
        modules: parsed.modules,
        assessments: parsed.assessments,
        alerts: parsed.alerts,
        protocols: parsed.protocols,
    })
}

/// Recursively load and merge all `.toml` catalog files in a directory.
/// Files are visited in path order so the merged catalog is deterministic.
pub fn load_catalog_directory(dir: &Path) -> Result<Catalog> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut catalog = Catalog::default();
    for path in paths {
        if path.is_dir() {
            catalog.merge(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(part) => catalog.merge(part),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalog)
}

/// Load a catalog from a file or a directory.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if path.is_dir() {
        load_catalog_directory(path)
    } else {
        parse_catalog(path)
    }
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The offending item's id (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn item(id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

fn duplicates<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Vec<ValidationWarning> {
    let mut seen = HashSet::new();
    ids.filter(|id| !seen.insert(*id))
        .map(|id| ValidationWarning::item(id, format!("duplicate {kind} ID: {id}")))
        .collect()
}

/// Validate a catalog for common issues.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    warnings.extend(duplicates("module", catalog.modules.iter().map(|m| m.id.as_str())));
    warnings.extend(duplicates(
        "assessment",
        catalog.assessments.iter().map(|a| a.id.as_str()),
    ));
    warnings.extend(duplicates("alert", catalog.alerts.iter().map(|a| a.id.as_str())));
    warnings.extend(duplicates(
        "protocol",
        catalog.protocols.iter().map(|p| p.id.as_str()),
    ));

    let module_ids: HashSet<&str> = catalog.modules.iter().map(|m| m.id.as_str()).collect();

    for module in &catalog.modules {
        for prereq in &module.prerequisites {
            if !module_ids.contains(prereq.as_str()) {
                warnings.push(ValidationWarning::item(
                    &module.id,
                    format!("prerequisite references unknown module: {prereq}"),
                ));
            }
        }
    }

    for assessment in &catalog.assessments {
        if !module_ids.contains(assessment.module_id.as_str()) {
            warnings.push(ValidationWarning::item(
                &assessment.id,
                format!("references unknown module: {}", assessment.module_id),
            ));
        }
        if assessment.max_attempts == 0 {
            warnings.push(ValidationWarning::item(
                &assessment.id,
                "max_attempts is 0, no attempt can ever begin",
            ));
        }
        if !(0.0..=100.0).contains(&assessment.passing_score) {
            warnings.push(ValidationWarning::item(
                &assessment.id,
                format!(
                    "passing_score {} is outside 0-100",
                    assessment.passing_score
                ),
            ));
        }
        if assessment.questions.is_empty() {
            warnings.push(ValidationWarning::item(&assessment.id, "has no questions"));
        }
        for question in &assessment.questions {
            match &question.correct_answer {
                None => warnings.push(ValidationWarning::item(
                    &assessment.id,
                    format!("question {} has no correct_answer", question.id),
                )),
                Some(answer) if !question.options.is_empty() => {
                    let listed = question
                        .options
                        .iter()
                        .any(|o| o.trim().eq_ignore_ascii_case(answer.trim()));
                    if !listed {
                        warnings.push(ValidationWarning::item(
                            &assessment.id,
                            format!(
                                "question {} correct_answer is not among its options",
                                question.id
                            ),
                        ));
                    }
                }
                Some(_) => {}
            }
        }
    }

    for alert in &catalog.alerts {
        if alert.expires_at.is_some_and(|e| e <= alert.created_at) {
            warnings.push(ValidationWarning::item(
                &alert.id,
                "expires_at is not after created_at, alert is never visible",
            ));
        }
    }

    for protocol in &catalog.protocols {
        if protocol.steps.is_empty() {
            warnings.push(ValidationWarning::item(&protocol.id, "protocol has no steps"));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertAudience, Audience, ProtocolScope, QuestionKind, Severity};
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[[modules]]
id = "quake-101"
title = "Earthquake Basics"
target_audience = "primary"
content_type = "video"
content_url = "https://content.example/quake-101"
duration_minutes = 20

[[modules]]
id = "fire-201"
title = "Fire Evacuation"
target_audience = "secondary"
prerequisites = ["quake-101"]

[[assessments]]
id = "quake-101-cert"
module_id = "quake-101"
title = "Earthquake certification"
passing_score = 70.0
max_attempts = 2
is_certification = true

[[assessments.questions]]
id = "q1"
prompt = "What do you do when the ground shakes?"
options = ["Drop, cover, hold", "Run outside"]
correct_answer = "Drop, cover, hold"

[[assessments.questions]]
id = "q2"
prompt = "Elevators are safe during an earthquake."
options = ["true", "false"]
correct_answer = "false"
type = "true_false"

[[alerts]]
id = "alert-1"
institution_id = "inst-a"
title = "Heavy rain warning"
message = "Stay indoors after 4pm."
severity = "high"
audience = "students"
created_at = "2026-10-01T08:00:00Z"
expires_at = "2026-10-02T08:00:00Z"

[[protocols]]
id = "quake-drill"
title = "Earthquake drill"
institution_type = "both"

[[protocols.steps]]
order = 1
instruction = "Drop, cover, and hold on"

[[protocols.emergency_contacts]]
name = "Emergency services"
phone = "112"
"#;

    #[test]
    fn parse_valid_toml() {
        let catalog = parse_catalog_str(VALID_TOML, &PathBuf::from("catalog.toml")).unwrap();
        assert_eq!(catalog.modules.len(), 2);
        assert_eq!(catalog.modules[0].target_audience, Audience::Primary);
        assert_eq!(catalog.modules[1].language, "en");
        assert!(catalog.modules[1].is_active);

        let assessment = catalog.assessment("quake-101-cert").unwrap();
        assert_eq!(assessment.max_attempts, 2);
        assert_eq!(assessment.time_limit_minutes, 30);
        assert_eq!(assessment.questions[1].kind, QuestionKind::TrueFalse);
        assert_eq!(
            catalog.assessment_for_module("quake-101").unwrap().id,
            "quake-101-cert"
        );

        assert_eq!(catalog.alerts[0].severity, Severity::High);
        assert_eq!(catalog.alerts[0].audience, AlertAudience::Students);
        assert!(catalog.alerts[0].is_active);
        assert_eq!(catalog.protocols[0].institution_type, ProtocolScope::Both);

        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_catalog_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_problems() {
        let toml = r#"
[[modules]]
id = "m1"
title = "One"
target_audience = "college"
prerequisites = ["ghost"]

[[modules]]
id = "m1"
title = "Duplicate"
target_audience = "college"

[[assessments]]
id = "a1"
module_id = "missing"
max_attempts = 0
passing_score = 120.0

[[assessments.questions]]
id = "q1"
prompt = "?"
options = ["yes", "no"]
correct_answer = "maybe"

[[assessments.questions]]
id = "q2"
prompt = "??"

[[alerts]]
id = "stale"
institution_id = "i"
title = "Stale"
severity = "low"
created_at = "2026-10-01T08:00:00Z"
expires_at = "2026-10-01T08:00:00Z"
"#;
        let catalog = parse_catalog_str(toml, &PathBuf::from("t.toml")).unwrap();
        let messages: Vec<String> = validate_catalog(&catalog)
            .into_iter()
            .map(|w| w.message)
            .collect();
        let has = |needle: &str| messages.iter().any(|m| m.contains(needle));
        assert!(has("duplicate module"));
        assert!(has("unknown module: ghost"));
        assert!(has("unknown module: missing"));
        assert!(has("max_attempts is 0"));
        assert!(has("outside 0-100"));
        assert!(has("not among its options"));
        assert!(has("q2 has no correct_answer"));
        assert!(has("never visible"));
    }

    #[test]
    fn load_directory_merges_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), VALID_TOML).unwrap();
        std::fs::write(
            dir.path().join("a.toml"),
            r#"
[[modules]]
id = "first"
title = "First"
target_audience = "college"
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = load_catalog_directory(dir.path()).unwrap();
        assert_eq!(catalog.modules.len(), 3);
        assert_eq!(catalog.modules[0].id, "first");
        assert_eq!(catalog.assessments.len(), 1);
    }

    #[test]
    fn load_catalog_missing_file() {
        assert!(load_catalog(Path::new("does-not-exist.toml")).is_err());
    }
}

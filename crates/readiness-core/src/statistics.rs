//! Per-learner and per-module aggregates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::eligibility::{classify_audience, select_modules};
use crate::model::{AttemptRecord, Learner, Module, ProgressRecord, ProgressStatus};

/// One module's row in a learner summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRow {
    pub module_id: String,
    pub title: String,
    pub status: ProgressStatus,
    pub progress_percentage: f64,
    pub score: Option<f64>,
}

/// A certification the learner has earned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub module_id: String,
    pub title: String,
    pub certified_at: DateTime<Utc>,
}

/// Progress overview for one learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerSummary {
    pub learner_id: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ModuleRow>,
    /// Mean of the row percentages; 0 when there are no rows.
    pub overall_percentage: f64,
    pub certifications: Vec<Certification>,
}

impl LearnerSummary {
    pub fn count_with_status(&self, status: ProgressStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }
}

/// Build a learner summary.
///
/// One row per module eligible for the learner, in catalog order. Records
/// for modules outside the learner's audience are left out.
pub fn learner_summary(
    learner: &Learner,
    modules: &[Module],
    records: &[ProgressRecord],
    now: DateTime<Utc>,
) -> LearnerSummary {
    let audience = classify_audience(learner);
    let by_module: HashMap<&str, &ProgressRecord> = records
        .iter()
        .filter(|r| r.learner_id == learner.id)
        .map(|r| (r.module_id.as_str(), r))
        .collect();

    let mut rows = Vec::new();
    let mut certifications = Vec::new();

    for module in select_modules(audience, modules) {
        let record = by_module.get(module.id.as_str()).copied();

        let row = match record {
            Some(r) => ModuleRow {
                module_id: module.id.clone(),
                title: module.title.clone(),
                status: r.status,
                progress_percentage: r.progress_percentage,
                score: r.score,
            },
            None => ModuleRow {
                module_id: module.id.clone(),
                title: module.title.clone(),
                status: ProgressStatus::NotStarted,
                progress_percentage: 0.0,
                score: None,
            },
        };

        if let Some(certified_at) = record.and_then(|r| r.certification_date) {
            certifications.push(Certification {
                module_id: module.id.clone(),
                title: module.title.clone(),
                certified_at,
            });
        }
        rows.push(row);
    }

    let overall_percentage = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| r.progress_percentage).sum::<f64>() / rows.len() as f64
    };

    LearnerSummary {
        learner_id: learner.id.clone(),
        generated_at: now,
        rows,
        overall_percentage,
        certifications,
    }
}

/// Aggregates for one module across all learners.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleStats {
    pub module_id: String,
    /// Learners with a progress record.
    pub learners: usize,
    pub per_status: HashMap<ProgressStatus, usize>,
    /// Mean score over records that carry one.
    pub average_score: Option<f64>,
    pub attempts: usize,
    pub attempts_passed: usize,
    /// Passed over completed attempts.
    pub pass_rate: Option<f64>,
}

/// Compute module aggregates from its progress records and the attempts at
/// its assessments.
pub fn module_stats(
    module_id: &str,
    records: &[ProgressRecord],
    attempts: &[AttemptRecord],
) -> ModuleStats {
    let records: Vec<&ProgressRecord> = records.iter().filter(|r| r.module_id == module_id).collect();

    let mut per_status = HashMap::new();
    for r in &records {
        *per_status.entry(r.status).or_insert(0usize) += 1;
    }

    let scores: Vec<f64> = records.iter().filter_map(|r| r.score).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    let completed = attempts.iter().filter(|a| a.is_completed()).count();
    let attempts_passed = attempts.iter().filter(|a| a.passed == Some(true)).count();
    let pass_rate = if completed == 0 {
        None
    } else {
        Some(attempts_passed as f64 / completed as f64)
    };

    ModuleStats {
        module_id: module_id.to_string(),
        learners: records.len(),
        per_status,
        average_score,
        attempts: attempts.len(),
        attempts_passed,
        pass_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Audience, ContentType, Role};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
    }

    fn module(id: &str, audience: Audience) -> Module {
        Module {
            id: id.into(),
            title: format!("{id} title"),
            description: String::new(),
            target_audience: audience,
            content_type: ContentType::Interactive,
            content_url: None,
            duration_minutes: None,
            language: "en".into(),
            is_active: true,
            prerequisites: vec![],
        }
    }

    fn record(module_id: &str, status: ProgressStatus, pct: f64, score: Option<f64>) -> ProgressRecord {
        let mut r = ProgressRecord::new("s1", module_id);
        r.status = status;
        r.progress_percentage = pct;
        r.score = score;
        if status == ProgressStatus::Certified {
            r.certification_date = Some(now());
        }
        r
    }

    #[test]
    fn summary_rows_and_overall() {
        let learner = Learner::new(
            "s1",
            "inst",
            Role::Student {
                grade_level: Some("2".into()),
            },
        );
        let modules = vec![
            module("fire", Audience::Primary),
            module("quake", Audience::Primary),
            module("campus", Audience::College),
            module("flood", Audience::Secondary),
        ];
        let records = vec![
            record("fire", ProgressStatus::Certified, 100.0, Some(95.0)),
            record("flood", ProgressStatus::InProgress, 60.0, None),
        ];

        let summary = learner_summary(&learner, &modules, &records, now());
        let ids: Vec<&str> = summary.rows.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(ids, vec!["fire", "quake"]);
        assert!((summary.overall_percentage - 50.0).abs() < 1e-9);
        assert_eq!(summary.certifications.len(), 1);
        assert_eq!(summary.certifications[0].module_id, "fire");
        assert_eq!(summary.count_with_status(ProgressStatus::NotStarted), 1);
    }

    #[test]
    fn records_outside_audience_are_not_rows() {
        let learner = Learner::new(
            "s1",
            "inst",
            Role::Student {
                grade_level: Some("9".into()),
            },
        );
        let modules = vec![
            module("quake", Audience::Primary),
            module("flood", Audience::Secondary),
        ];
        let records = vec![
            record("quake", ProgressStatus::Certified, 100.0, Some(90.0)),
            record("flood", ProgressStatus::InProgress, 40.0, None),
        ];

        let summary = learner_summary(&learner, &modules, &records, now());
        let ids: Vec<&str> = summary.rows.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(ids, vec!["flood"]);
        assert!((summary.overall_percentage - 40.0).abs() < 1e-9);
        assert!(summary.certifications.is_empty());
    }

    #[test]
    fn empty_summary_is_zero() {
        let learner = Learner::new("t1", "inst", Role::Teacher);
        let summary = learner_summary(&learner, &[], &[], now());
        assert!(summary.rows.is_empty());
        assert_eq!(summary.overall_percentage, 0.0);
    }

    #[test]
    fn module_aggregates() {
        let mut other = record("fire", ProgressStatus::Completed, 100.0, Some(70.0));
        other.learner_id = "s2".into();
        let records = vec![
            record("fire", ProgressStatus::Certified, 100.0, Some(90.0)),
            other,
            record("quake", ProgressStatus::InProgress, 10.0, None),
        ];
        let attempt = |passed: Option<bool>| AttemptRecord {
            id: "x".into(),
            learner_id: "s1".into(),
            assessment_id: "fire-quiz".into(),
            attempt_number: 1,
            answers: vec![],
            score: None,
            passed,
            time_taken_secs: None,
            started_at: now(),
            completed_at: passed.map(|_| now()),
        };
        let attempts = vec![attempt(Some(true)), attempt(Some(false)), attempt(None)];

        let stats = module_stats("fire", &records, &attempts);
        assert_eq!(stats.learners, 2);
        assert_eq!(stats.per_status.get(&ProgressStatus::Certified), Some(&1));
        assert_eq!(stats.average_score, Some(80.0));
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.attempts_passed, 1);
        assert_eq!(stats.pass_rate, Some(0.5));
    }
}

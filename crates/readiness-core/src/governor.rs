//! Assessment attempt governor.
//!
//! Enforces the per-(learner, assessment) attempt quota, hands out redacted
//! question sets, scores submissions, and writes certification back to the
//! progress ledger.
//!
//! Scoring policy: the score is the percentage of questions answered
//! correctly, rounded to one decimal place (half away from zero). A response
//! is correct when it equals the question's answer key after trimming and
//! ignoring ASCII case. Questions without an answer key never count as
//! correct. An assessment without questions scores 0.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ledger::ProgressLedger;
use crate::model::{Answer, Assessment, AttemptRecord, ProgressRecord, PublicQuestion, Question};
use crate::traits::{Allocation, AttemptStore, CatalogStore, Finalization};

/// What a learner receives when an attempt begins. Carries no answer keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BegunAttempt {
    pub attempt_id: String,
    pub attempt_number: u32,
    pub assessment_id: String,
    pub title: String,
    pub questions: Vec<PublicQuestion>,
    pub time_limit_minutes: u32,
    /// Advisory: submissions after the deadline are still scored but flagged.
    pub deadline: DateTime<Utc>,
    pub attempts_remaining: u32,
}

/// The scored result of a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub attempt: AttemptRecord,
    pub score: f64,
    pub passed: bool,
    /// Whether the submission arrived after the time limit.
    pub overtime: bool,
    /// The module's progress after certification write-back, if any.
    pub certified_progress: Option<ProgressRecord>,
}

/// Quota usage for a (learner, assessment) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStatus {
    pub assessment_id: String,
    pub max_attempts: u32,
    pub attempts_used: u32,
    pub attempts_remaining: u32,
    pub best_score: Option<f64>,
    pub passed: bool,
}

impl AttemptStatus {
    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }
}

/// Round a raw percentage to one decimal place.
pub fn round_score(raw: f64) -> f64 {
    (raw * 10.0).round() / 10.0
}

fn normalize(response: &str) -> String {
    response.trim().to_ascii_lowercase()
}

/// Whether `answer` is a correct response to `question`.
pub fn is_correct(question: &Question, answer: &Answer) -> bool {
    match &question.correct_answer {
        Some(key) => normalize(key) == normalize(&answer.response),
        None => false,
    }
}

/// Score a set of answers against a question list.
///
/// Only the first answer for each question id is considered; answers for
/// unknown question ids are ignored.
pub fn score_answers(questions: &[Question], answers: &[Answer]) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }
    let correct = questions
        .iter()
        .filter(|q| {
            answers
                .iter()
                .find(|a| a.question_id == q.id)
                .is_some_and(|a| is_correct(q, a))
        })
        .count();
    round_score(correct as f64 / questions.len() as f64 * 100.0)
}

/// Service enforcing attempt quotas and scoring.
pub struct AttemptGovernor {
    catalog: Arc<dyn CatalogStore>,
    attempts: Arc<dyn AttemptStore>,
    ledger: Arc<ProgressLedger>,
}

impl AttemptGovernor {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        attempts: Arc<dyn AttemptStore>,
        ledger: Arc<ProgressLedger>,
    ) -> Self {
        Self {
            catalog,
            attempts,
            ledger,
        }
    }

    async fn load_assessment(&self, assessment_id: &str) -> Result<Assessment, CoreError> {
        self.catalog
            .assessment(assessment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("assessment", assessment_id))
    }

    /// Consume one attempt slot and return the redacted question set.
    ///
    /// A begun attempt that is never submitted still counts against the
    /// quota.
    pub async fn begin_attempt(
        &self,
        learner_id: &str,
        assessment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BegunAttempt, CoreError> {
        let assessment = self.load_assessment(assessment_id).await?;

        let record = match self
            .attempts
            .allocate_attempt(learner_id, &assessment.id, assessment.max_attempts, now)
            .await?
        {
            Allocation::Granted(record) => record,
            Allocation::Exhausted { used } => {
                tracing::info!(
                    learner = learner_id,
                    assessment = assessment_id,
                    used,
                    "attempt refused, quota exhausted"
                );
                return Err(CoreError::AttemptsExhausted {
                    assessment_id: assessment.id,
                    used,
                    max: assessment.max_attempts,
                });
            }
        };

        tracing::info!(
            learner = learner_id,
            assessment = assessment_id,
            attempt = record.attempt_number,
            "attempt started"
        );

        Ok(BegunAttempt {
            attempt_id: record.id,
            attempt_number: record.attempt_number,
            questions: assessment.questions.iter().map(PublicQuestion::from).collect(),
            time_limit_minutes: assessment.time_limit_minutes,
            deadline: now + Duration::minutes(i64::from(assessment.time_limit_minutes)),
            attempts_remaining: assessment.max_attempts.saturating_sub(record.attempt_number),
            assessment_id: assessment.id,
            title: assessment.title,
        })
    }

    /// Score and finalize an attempt. Passing a certification assessment
    /// completes and certifies the owning module.
    ///
    /// The certification write-back happens before the attempt is finalized.
    /// If it fails the attempt stays open and can be submitted again.
    pub async fn submit_attempt(
        &self,
        attempt_id: &str,
        answers: Vec<Answer>,
        now: DateTime<Utc>,
    ) -> Result<AttemptOutcome, CoreError> {
        let attempt = self
            .attempts
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| CoreError::InvalidState(format!("attempt {attempt_id} does not exist")))?;
        if attempt.is_completed() {
            return Err(already_completed(attempt_id));
        }

        let assessment = self.load_assessment(&attempt.assessment_id).await?;
        let score = score_answers(&assessment.questions, &answers);
        let passed = score >= assessment.passing_score;
        let time_taken_secs = (now - attempt.started_at).num_seconds().max(0) as u64;
        let overtime = time_taken_secs > u64::from(assessment.time_limit_minutes) * 60;

        let certified_progress = if passed && assessment.is_certification {
            let progress = self
                .ledger
                .complete_and_certify(&attempt.learner_id, &assessment.module_id, Some(score), now)
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        attempt = attempt_id,
                        error = %e,
                        "certification write-back failed, attempt left open"
                    );
                })?;
            Some(progress)
        } else {
            None
        };

        let completed = AttemptRecord {
            answers,
            score: Some(score),
            passed: Some(passed),
            time_taken_secs: Some(time_taken_secs),
            completed_at: Some(now),
            ..attempt
        };

        match self.attempts.finalize_attempt(completed.clone()).await? {
            Finalization::Stored => {}
            Finalization::AlreadyCompleted => return Err(already_completed(attempt_id)),
            Finalization::Missing => {
                return Err(CoreError::InvalidState(format!(
                    "attempt {attempt_id} does not exist"
                )))
            }
        }

        tracing::info!(
            learner = %completed.learner_id,
            assessment = %completed.assessment_id,
            attempt = completed.attempt_number,
            score,
            passed,
            "attempt submitted"
        );

        Ok(AttemptOutcome {
            attempt: completed,
            score,
            passed,
            overtime,
            certified_progress,
        })
    }

    /// Quota usage and best result for a learner.
    pub async fn attempt_status(
        &self,
        learner_id: &str,
        assessment_id: &str,
    ) -> Result<AttemptStatus, CoreError> {
        let assessment = self.load_assessment(assessment_id).await?;
        let attempts = self.attempts.list_attempts(learner_id, &assessment.id).await?;
        let used = attempts.len() as u32;

        let best_score = attempts
            .iter()
            .filter_map(|a| a.score)
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))));

        Ok(AttemptStatus {
            assessment_id: assessment.id,
            max_attempts: assessment.max_attempts,
            attempts_used: used,
            attempts_remaining: assessment.max_attempts.saturating_sub(used),
            best_score,
            passed: attempts.iter().any(|a| a.passed == Some(true)),
        })
    }
}

fn already_completed(attempt_id: &str) -> CoreError {
    CoreError::InvalidState(format!("attempt {attempt_id} is already completed"))
}

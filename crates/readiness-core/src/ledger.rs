//! Progress ledger.
//!
//! Owns the per-(learner, module) status machine:
//! `not_started -> in_progress -> completed -> certified`.
//! Transitions are pure methods on [`ProgressRecord`]; the ledger runs them
//! through [`ProgressStore::update_progress`] so each one is a single atomic
//! read-modify-write.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{ProgressRecord, ProgressStatus};
use crate::traits::{CatalogStore, ProgressStore};

impl ProgressRecord {
    /// Move to `in_progress` if not started yet. Never overwrites an existing
    /// `started_at` and never moves a later status backwards.
    ///
    /// Returns `true` if the record changed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != ProgressStatus::NotStarted {
            return false;
        }
        self.status = ProgressStatus::InProgress;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        true
    }

    /// Move from `in_progress` to `completed`.
    pub fn complete(&mut self, score: Option<f64>, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.status != ProgressStatus::InProgress {
            return Err(self.invalid("complete", ProgressStatus::InProgress));
        }
        self.status = ProgressStatus::Completed;
        self.completed_at = Some(now);
        self.progress_percentage = 100.0;
        if score.is_some() {
            self.score = score;
        }
        Ok(())
    }

    /// Move from `completed` to `certified`.
    pub fn certify(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.status != ProgressStatus::Completed {
            return Err(self.invalid("certify", ProgressStatus::Completed));
        }
        self.status = ProgressStatus::Certified;
        self.certification_date = Some(now);
        Ok(())
    }

    /// Record content consumption on an `in_progress` record. The percentage
    /// is clamped to [0, 100] and never decreases; time accumulates.
    pub fn record_activity(&mut self, percentage: f64, minutes: u32) -> Result<(), CoreError> {
        if self.status != ProgressStatus::InProgress {
            return Err(self.invalid("record activity on", ProgressStatus::InProgress));
        }
        let clamped = if percentage.is_nan() {
            0.0
        } else {
            percentage.clamp(0.0, 100.0)
        };
        self.progress_percentage = self.progress_percentage.max(clamped);
        self.time_spent_minutes = self.time_spent_minutes.saturating_add(minutes);
        Ok(())
    }

    fn invalid(&self, action: &str, required: ProgressStatus) -> CoreError {
        CoreError::InvalidState(format!(
            "cannot {action} module {} for learner {}: status is {}, expected {required}",
            self.module_id, self.learner_id, self.status
        ))
    }
}

/// Service owning progress records.
pub struct ProgressLedger {
    catalog: Arc<dyn CatalogStore>,
    store: Arc<dyn ProgressStore>,
}

impl ProgressLedger {
    pub fn new(catalog: Arc<dyn CatalogStore>, store: Arc<dyn ProgressStore>) -> Self {
        Self { catalog, store }
    }

    /// Start (or resume) a module. Fails with `NotFound` if the module is
    /// missing or inactive.
    pub async fn start_module(
        &self,
        learner_id: &str,
        module_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, CoreError> {
        match self.catalog.module(module_id).await? {
            Some(module) if module.is_active => {}
            _ => return Err(CoreError::not_found("module", module_id)),
        }

        let record = self
            .store
            .update_progress(learner_id, module_id, &|current| {
                let mut record =
                    current.unwrap_or_else(|| ProgressRecord::new(learner_id, module_id));
                record.start(now);
                Ok(record)
            })
            .await?;

        tracing::debug!(
            learner = learner_id,
            module = module_id,
            status = %record.status,
            "module started"
        );
        Ok(record)
    }

    /// Mark an `in_progress` module as completed.
    pub async fn record_completion(
        &self,
        learner_id: &str,
        module_id: &str,
        score: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, CoreError> {
        let record = self
            .store
            .update_progress(learner_id, module_id, &|current| {
                let mut record = existing(current, learner_id, module_id)?;
                record.complete(score, now)?;
                Ok(record)
            })
            .await?;

        tracing::info!(learner = learner_id, module = module_id, "module completed");
        Ok(record)
    }

    /// Certify a completed module.
    pub async fn certify(
        &self,
        learner_id: &str,
        module_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, CoreError> {
        let record = self
            .store
            .update_progress(learner_id, module_id, &|current| {
                let mut record = existing(current, learner_id, module_id)?;
                record.certify(now)?;
                Ok(record)
            })
            .await?;

        tracing::info!(learner = learner_id, module = module_id, "module certified");
        Ok(record)
    }

    /// Walk a record through whatever of start, complete, and certify it has
    /// not reached yet, in one atomic mutation. Already-certified records are
    /// returned unchanged.
    pub async fn complete_and_certify(
        &self,
        learner_id: &str,
        module_id: &str,
        score: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, CoreError> {
        let record = self
            .store
            .update_progress(learner_id, module_id, &|current| {
                let mut record =
                    current.unwrap_or_else(|| ProgressRecord::new(learner_id, module_id));
                record.start(now);
                if record.status == ProgressStatus::InProgress {
                    record.complete(score, now)?;
                }
                if record.status == ProgressStatus::Completed {
                    record.certify(now)?;
                }
                Ok(record)
            })
            .await?;

        tracing::info!(
            learner = learner_id,
            module = module_id,
            "module completed and certified"
        );
        Ok(record)
    }

    /// Record content consumption for an `in_progress` module.
    pub async fn record_activity(
        &self,
        learner_id: &str,
        module_id: &str,
        percentage: f64,
        minutes: u32,
    ) -> Result<ProgressRecord, CoreError> {
        self.store
            .update_progress(learner_id, module_id, &|current| {
                let mut record = existing(current, learner_id, module_id)?;
                record.record_activity(percentage, minutes)?;
                Ok(record)
            })
            .await
    }

    /// The learner's record, or the `not_started` default when none exists.
    pub async fn get_progress(
        &self,
        learner_id: &str,
        module_id: &str,
    ) -> Result<ProgressRecord, CoreError> {
        Ok(self
            .store
            .get_progress(learner_id, module_id)
            .await?
            .unwrap_or_else(|| ProgressRecord::new(learner_id, module_id)))
    }

    /// Every record the learner has.
    pub async fn progress_for_learner(
        &self,
        learner_id: &str,
    ) -> Result<Vec<ProgressRecord>, CoreError> {
        Ok(self.store.progress_for_learner(learner_id).await?)
    }
}

fn existing(
    current: Option<ProgressRecord>,
    learner_id: &str,
    module_id: &str,
) -> Result<ProgressRecord, CoreError> {
    current.ok_or_else(|| {
        CoreError::InvalidState(format!(
            "learner {learner_id} has not started module {module_id}"
        ))
    })
}

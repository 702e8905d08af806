//! In-memory persistence adapter.
//!
//! Every port method takes the state lock once and releases it before
//! returning, so each read-modify-write (quota check plus insert, progress
//! transition, attempt finalization) is atomic with respect to other callers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use readiness_core::error::{CoreError, StoreError};
use readiness_core::model::{
    Alert, Assessment, AttemptRecord, Catalog, EmergencyProtocol, Module, ProgressRecord,
};
use readiness_core::traits::{
    Allocation, AlertStore, AttemptStore, CatalogStore, Finalization, ProgressMutation,
    ProgressStore,
};

use crate::snapshot::Snapshot;

#[derive(Debug, Default)]
struct State {
    progress: BTreeMap<(String, String), ProgressRecord>,
    /// Insertion order.
    attempts: Vec<AttemptRecord>,
    retracted_alerts: BTreeSet<String>,
}

/// A store holding the catalog and all mutable records in memory.
pub struct MemoryStore {
    catalog: Catalog,
    state: Mutex<State>,
}

impl MemoryStore {
    /// An empty store over `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self::from_snapshot(catalog, Snapshot::default())
    }

    /// Restore previously saved records on top of `catalog`.
    pub fn from_snapshot(catalog: Catalog, snapshot: Snapshot) -> Self {
        let progress = snapshot
            .progress
            .into_iter()
            .map(|r| ((r.learner_id.clone(), r.module_id.clone()), r))
            .collect();
        Self {
            catalog,
            state: Mutex::new(State {
                progress,
                attempts: snapshot.attempts,
                retracted_alerts: snapshot.retracted_alerts,
            }),
        }
    }

    /// Capture the mutable records for persistence.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let state = self.lock()?;
        Ok(Snapshot {
            progress: state.progress.values().cloned().collect(),
            attempts: state.attempts.clone(),
            retracted_alerts: state.retracted_alerts.clone(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Corrupted("state lock poisoned".into()))
    }

    fn apply_retraction(&self, alert: &Alert, state: &State) -> Alert {
        let mut alert = alert.clone();
        if state.retracted_alerts.contains(&alert.id) {
            alert.is_active = false;
        }
        alert
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn module(&self, module_id: &str) -> Result<Option<Module>, StoreError> {
        Ok(self.catalog.module(module_id).cloned())
    }

    async fn modules(&self) -> Result<Vec<Module>, StoreError> {
        Ok(self.catalog.modules.clone())
    }

    async fn assessment(&self, assessment_id: &str) -> Result<Option<Assessment>, StoreError> {
        Ok(self.catalog.assessment(assessment_id).cloned())
    }

    async fn assessments_for_module(
        &self,
        module_id: &str,
    ) -> Result<Vec<Assessment>, StoreError> {
        Ok(self
            .catalog
            .assessments
            .iter()
            .filter(|a| a.module_id == module_id)
            .cloned()
            .collect())
    }

    async fn protocols(&self) -> Result<Vec<EmergencyProtocol>, StoreError> {
        Ok(self.catalog.protocols.clone())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_progress(
        &self,
        learner_id: &str,
        module_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .progress
            .get(&(learner_id.to_string(), module_id.to_string()))
            .cloned())
    }

    async fn update_progress(
        &self,
        learner_id: &str,
        module_id: &str,
        mutation: &ProgressMutation<'_>,
    ) -> Result<ProgressRecord, CoreError> {
        let key = (learner_id.to_string(), module_id.to_string());
        let mut state = self.lock()?;
        let updated = mutation(state.progress.get(&key).cloned())?;
        state.progress.insert(key, updated.clone());
        Ok(updated)
    }

    async fn progress_for_learner(
        &self,
        learner_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .progress
            .values()
            .filter(|r| r.learner_id == learner_id)
            .cloned()
            .collect())
    }

    async fn progress_for_module(&self, module_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .progress
            .values()
            .filter(|r| r.module_id == module_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn allocate_attempt(
        &self,
        learner_id: &str,
        assessment_id: &str,
        max_attempts: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Allocation, StoreError> {
        let mut state = self.lock()?;
        let used = state
            .attempts
            .iter()
            .filter(|a| a.learner_id == learner_id && a.assessment_id == assessment_id)
            .count() as u32;

        if used >= max_attempts {
            return Ok(Allocation::Exhausted { used });
        }

        let record = AttemptRecord {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            assessment_id: assessment_id.to_string(),
            attempt_number: used + 1,
            answers: Vec::new(),
            score: None,
            passed: None,
            time_taken_secs: None,
            started_at,
            completed_at: None,
        };
        state.attempts.push(record.clone());
        Ok(Allocation::Granted(record))
    }

    async fn get_attempt(&self, attempt_id: &str) -> Result<Option<AttemptRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state.attempts.iter().find(|a| a.id == attempt_id).cloned())
    }

    async fn finalize_attempt(
        &self,
        completed: AttemptRecord,
    ) -> Result<Finalization, StoreError> {
        let mut state = self.lock()?;
        let Some(slot) = state.attempts.iter_mut().find(|a| a.id == completed.id) else {
            return Ok(Finalization::Missing);
        };
        if slot.is_completed() {
            return Ok(Finalization::AlreadyCompleted);
        }
        *slot = completed;
        Ok(Finalization::Stored)
    }

    async fn list_attempts(
        &self,
        learner_id: &str,
        assessment_id: &str,
    ) -> Result<Vec<AttemptRecord>, StoreError> {
        let state = self.lock()?;
        let mut attempts: Vec<AttemptRecord> = state
            .attempts
            .iter()
            .filter(|a| a.learner_id == learner_id && a.assessment_id == assessment_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.attempt_number);
        Ok(attempts)
    }

    async fn attempts_for_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<Vec<AttemptRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .attempts
            .iter()
            .filter(|a| a.assessment_id == assessment_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn alerts_for_institution(
        &self,
        institution_id: &str,
    ) -> Result<Vec<Alert>, StoreError> {
        let state = self.lock()?;
        Ok(self
            .catalog
            .alerts
            .iter()
            .filter(|a| a.institution_id == institution_id)
            .map(|a| self.apply_retraction(a, &state))
            .collect())
    }

    async fn alert(&self, alert_id: &str) -> Result<Option<Alert>, StoreError> {
        let state = self.lock()?;
        Ok(self
            .catalog
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .map(|a| self.apply_retraction(a, &state)))
    }

    async fn set_alert_active(
        &self,
        alert_id: &str,
        active: bool,
    ) -> Result<Option<Alert>, StoreError> {
        let mut state = self.lock()?;
        let Some(alert) = self.catalog.alerts.iter().find(|a| a.id == alert_id) else {
            return Ok(None);
        };
        if active {
            state.retracted_alerts.remove(alert_id);
        } else {
            state.retracted_alerts.insert(alert_id.to_string());
        }
        let mut alert = alert.clone();
        alert.is_active = alert.is_active && active;
        Ok(Some(alert))
    }
}

//! Persistence ports.
//!
//! The ledger, the governor, and the alert desk talk to storage only through
//! these async traits. Adapters live in `readiness-store`. Each mutating
//! method is a single bounded read-modify-write that the adapter must execute
//! atomically with respect to other writers of the same row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{CoreError, StoreError};
use crate::model::{Alert, Assessment, AttemptRecord, EmergencyProtocol, Module, ProgressRecord};

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Read access to modules, assessments, and protocols.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn module(&self, module_id: &str) -> Result<Option<Module>, StoreError>;

    /// All modules, in catalog order.
    async fn modules(&self) -> Result<Vec<Module>, StoreError>;

    async fn assessment(&self, assessment_id: &str) -> Result<Option<Assessment>, StoreError>;

    async fn assessments_for_module(&self, module_id: &str)
        -> Result<Vec<Assessment>, StoreError>;

    async fn protocols(&self) -> Result<Vec<EmergencyProtocol>, StoreError>;
}

// ---------------------------------------------------------------------------
// Progress records
// ---------------------------------------------------------------------------

/// A transition applied to the current record for a (learner, module) key.
///
/// Receives `None` when no record exists yet. Returning `Ok` stores the
/// returned record under the key; returning `Err` leaves storage untouched.
pub type ProgressMutation<'a> =
    dyn Fn(Option<ProgressRecord>) -> Result<ProgressRecord, CoreError> + Send + Sync + 'a;

/// Storage for progress records, unique per (learner, module).
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_progress(
        &self,
        learner_id: &str,
        module_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError>;

    /// Apply `mutation` to the record for the key atomically.
    async fn update_progress(
        &self,
        learner_id: &str,
        module_id: &str,
        mutation: &ProgressMutation<'_>,
    ) -> Result<ProgressRecord, CoreError>;

    async fn progress_for_learner(&self, learner_id: &str)
        -> Result<Vec<ProgressRecord>, StoreError>;

    async fn progress_for_module(&self, module_id: &str) -> Result<Vec<ProgressRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Attempt records
// ---------------------------------------------------------------------------

/// Result of asking the store for a new attempt slot.
#[derive(Debug, Clone)]
pub enum Allocation {
    /// A new attempt record was inserted.
    Granted(AttemptRecord),
    /// The quota was already used up; nothing was inserted.
    Exhausted { used: u32 },
}

/// Result of finalizing an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalization {
    Stored,
    AlreadyCompleted,
    Missing,
}

/// Storage for attempt records, unique per (learner, assessment, number).
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Count the learner's attempts and, if fewer than `max_attempts`, insert
    /// attempt number `count + 1`. The count and the insert are one atomic
    /// step.
    async fn allocate_attempt(
        &self,
        learner_id: &str,
        assessment_id: &str,
        max_attempts: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Allocation, StoreError>;

    async fn get_attempt(&self, attempt_id: &str) -> Result<Option<AttemptRecord>, StoreError>;

    /// Replace the stored attempt with `completed` only if the stored one has
    /// not been completed yet.
    async fn finalize_attempt(&self, completed: AttemptRecord)
        -> Result<Finalization, StoreError>;

    /// The learner's attempts at an assessment, ordered by attempt number.
    async fn list_attempts(
        &self,
        learner_id: &str,
        assessment_id: &str,
    ) -> Result<Vec<AttemptRecord>, StoreError>;

    async fn attempts_for_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<Vec<AttemptRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Storage for alerts.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Every alert of the institution, in insertion order, including inactive
    /// and expired ones.
    async fn alerts_for_institution(&self, institution_id: &str)
        -> Result<Vec<Alert>, StoreError>;

    async fn alert(&self, alert_id: &str) -> Result<Option<Alert>, StoreError>;

    /// Set the active flag. Returns the updated alert, or `None` if absent.
    async fn set_alert_active(
        &self,
        alert_id: &str,
        active: bool,
    ) -> Result<Option<Alert>, StoreError>;
}

//! Module eligibility: which modules a learner is shown.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ledger::ProgressLedger;
use crate::model::{Audience, Learner, Module, ProgressRecord, Role};

/// Classify a learner into a module audience.
///
/// Staff roles read college material. Students in grades 1 through 5 read
/// primary material; every other grade value (6-12, "K", "7th", missing)
/// falls through to secondary.
pub fn classify_audience(learner: &Learner) -> Audience {
    match &learner.role {
        Role::Student { grade_level } => {
            let primary = grade_level
                .as_deref()
                .and_then(|g| g.trim().parse::<i32>().ok())
                .is_some_and(|g| (1..=5).contains(&g));
            if primary {
                Audience::Primary
            } else {
                Audience::Secondary
            }
        }
        Role::Teacher | Role::Admin | Role::Coordinator => Audience::College,
    }
}

/// Active modules for `audience`, input order preserved.
pub fn select_modules(audience: Audience, modules: &[Module]) -> Vec<&Module> {
    modules
        .iter()
        .filter(|m| m.is_active && m.target_audience == audience)
        .collect()
}

/// A module together with the learner's progress on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibleModule {
    pub module: Module,
    pub progress: ProgressRecord,
}

/// The learner's eligible modules, each enriched with its progress.
pub async fn eligible_modules(
    ledger: &ProgressLedger,
    learner: &Learner,
    modules: &[Module],
) -> Result<Vec<EligibleModule>, CoreError> {
    let audience = classify_audience(learner);
    let selected = select_modules(audience, modules);
    tracing::debug!(
        learner = %learner.id,
        %audience,
        count = selected.len(),
        "selected eligible modules"
    );

    // try_join_all yields results in input order
    try_join_all(selected.into_iter().map(|module| async move {
        let progress = ledger.get_progress(&learner.id, &module.id).await?;
        Ok::<_, CoreError>(EligibleModule {
            module: module.clone(),
            progress,
        })
    }))
    .await
}

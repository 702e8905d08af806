//! Alert visibility filtering and retraction.
//!
//! Expiry is evaluated lazily at read time; nothing sweeps expired alerts.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{Alert, AlertAudience, Learner, Role};
use crate::traits::AlertStore;

/// Whether an alert is live at `now`, ignoring institution and audience.
pub fn is_live(alert: &Alert, now: DateTime<Utc>) -> bool {
    alert.is_active && alert.expires_at.map_or(true, |expires| expires > now)
}

/// Alerts of `institution_id` that are active and unexpired at `now`, most
/// recent first. Alerts created at the same instant are ordered by id so the
/// result does not depend on how the store happened to return them.
pub fn visible_alerts(institution_id: &str, now: DateTime<Utc>, alerts: &[Alert]) -> Vec<Alert> {
    let mut visible: Vec<Alert> = alerts
        .iter()
        .filter(|a| a.institution_id == institution_id && is_live(a, now))
        .cloned()
        .collect();
    visible.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    visible
}

impl AlertAudience {
    /// Whether a learner with `role` is addressed by this audience. Admins
    /// and coordinators see every alert of their institution.
    pub fn matches(&self, role: &Role) -> bool {
        if role.manages_alerts() {
            return true;
        }
        match self {
            AlertAudience::All => true,
            AlertAudience::Students => role.is_student(),
            AlertAudience::Teachers => matches!(role, Role::Teacher),
            AlertAudience::Staff => !role.is_student(),
            AlertAudience::Grade(grade) => role
                .grade_level()
                .is_some_and(|g| g.trim().eq_ignore_ascii_case(grade)),
            AlertAudience::Other(_) => false,
        }
    }
}

/// Visible alerts addressed to the learner.
pub fn alerts_for_learner(learner: &Learner, now: DateTime<Utc>, alerts: &[Alert]) -> Vec<Alert> {
    visible_alerts(&learner.institution_id, now, alerts)
        .into_iter()
        .filter(|a| a.audience.matches(&learner.role))
        .collect()
}

/// High and critical alerts, order preserved.
pub fn urgent_alerts(alerts: &[Alert]) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|a| a.severity.is_urgent())
        .cloned()
        .collect()
}

/// Fetch the learner's institution alerts and filter them for the learner.
pub async fn poll_alerts(
    store: &dyn AlertStore,
    learner: &Learner,
    now: DateTime<Utc>,
) -> Result<Vec<Alert>, CoreError> {
    let alerts = store.alerts_for_institution(&learner.institution_id).await?;
    Ok(alerts_for_learner(learner, now, &alerts))
}

/// Force-retract an alert. Only admins and coordinators of the alert's
/// institution may do this. Retracting an inactive alert is a no-op.
pub async fn retract_alert(
    store: &dyn AlertStore,
    actor: &Learner,
    alert_id: &str,
) -> Result<Alert, CoreError> {
    let alert = store
        .alert(alert_id)
        .await?
        .ok_or_else(|| CoreError::not_found("alert", alert_id))?;

    if !actor.role.manages_alerts() || actor.institution_id != alert.institution_id {
        return Err(CoreError::Forbidden(format!(
            "{} {} may not retract alert {alert_id}",
            actor.role, actor.id
        )));
    }
    if !alert.is_active {
        return Ok(alert);
    }

    let updated = store
        .set_alert_active(alert_id, false)
        .await?
        .ok_or_else(|| CoreError::not_found("alert", alert_id))?;
    tracing::info!(alert = alert_id, actor = %actor.id, "alert retracted");
    Ok(updated)
}

//! Emergency protocol selection.

use crate::model::{EmergencyProtocol, InstitutionType, ProtocolStep};

/// Protocols for `institution`, plus those marked for both kinds of
/// institution. Input order preserved.
pub fn applicable_protocols(
    institution: InstitutionType,
    protocols: &[EmergencyProtocol],
) -> Vec<&EmergencyProtocol> {
    protocols
        .iter()
        .filter(|p| p.institution_type.applies_to(institution))
        .collect()
}

impl EmergencyProtocol {
    /// Steps sorted by their `order` field.
    pub fn ordered_steps(&self) -> Vec<&ProtocolStep> {
        let mut steps: Vec<&ProtocolStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }
}

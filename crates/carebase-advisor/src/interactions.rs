//! Drug interaction checks and substitution suggestions.

use std::collections::HashSet;

use tracing::debug;

use carebase_contracts::advisory::{Alternative, InteractionRecord, InteractionResult, MedicationEntry};

use crate::tables::{ALTERNATIVES, INTERACTIONS, INTERACTION_SEVERITY};

pub const NO_INTERACTIONS: &str = "No known interactions detected between the prescribed medications.";
pub const INTERACTIONS_FOUND: &str = "Potential drug interactions detected. Please review the warnings and consider adjusting medications or monitoring the patient more closely.";
pub const INTERACTION_DISCLAIMER: &str =
    "This is an automated check and not a substitute for pharmacist review.";

/// Report every known interacting pair among `medications`.
///
/// Names are compared lower-cased. Results follow the interaction table's
/// order, not the input order.
pub fn check_interactions(medications: &[MedicationEntry]) -> InteractionResult {
    let present: HashSet<String> = medications.iter().map(|m| m.name.to_lowercase()).collect();

    let interactions: Vec<InteractionRecord> = INTERACTIONS
        .iter()
        .filter(|(a, b, _)| present.contains(*a) && present.contains(*b))
        .map(|(a, b, warning)| InteractionRecord {
            medications: [a.to_string(), b.to_string()],
            severity: INTERACTION_SEVERITY.to_string(),
            warning: warning.to_string(),
        })
        .collect();

    debug!(
        medications = medications.len(),
        interactions = interactions.len(),
        "interaction check complete"
    );

    let recommendation = if interactions.is_empty() {
        NO_INTERACTIONS
    } else {
        INTERACTIONS_FOUND
    };

    InteractionResult {
        interactions,
        recommendation: recommendation.to_string(),
        disclaimer: INTERACTION_DISCLAIMER.to_string(),
    }
}

/// Known substitutes for `medication`, empty when there are none.
///
/// `reason` is recorded in the logs but does not filter or rank results.
pub fn suggest_alternatives(medication: &str, reason: &str) -> Vec<Alternative> {
    let key = medication.to_lowercase();
    debug!(medication = %key, reason = %reason, "alternatives requested");

    ALTERNATIVES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, alternatives)| {
            alternatives
                .iter()
                .map(|(name, why)| Alternative {
                    name: name.to_string(),
                    reason: why.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

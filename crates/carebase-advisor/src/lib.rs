//! # carebase-advisor
//!
//! Rule-based advisory helpers. Two independent parts:
//!
//! - **Symptom matching** ([`symptoms`]): ranks candidate conditions from a
//!   symptom table and derives a triage recommendation; suggests diagnostic
//!   tests from a fixed decision table.
//! - **Interaction checking** ([`interactions`]): reports known pairwise drug
//!   interactions and suggests substitutes.
//!
//! Every operation is a pure function of its input and immutable tables, so
//! one [`Advisor`] can be shared freely across threads.

use std::path::Path;

use carebase_contracts::advisory::{Alternative, DiagnosisResult, InteractionResult, MedicationEntry};

pub mod interactions;
pub mod symptoms;
pub mod tables;

pub use symptoms::SymptomMatcher;
pub use tables::SymptomTable;

/// The four advisory operations behind one handle.
#[derive(Debug, Clone, Default)]
pub struct Advisor {
    matcher: SymptomMatcher,
}

impl Advisor {
    pub fn new(table: SymptomTable) -> Self {
        Self {
            matcher: SymptomMatcher::new(table),
        }
    }

    /// Build an advisor over the symptom table at `path`, falling back to an
    /// empty table when it cannot be loaded.
    pub fn from_table_path(path: &Path) -> Self {
        Self::new(SymptomTable::load(path))
    }

    pub fn symptom_count(&self) -> usize {
        self.matcher.table().len()
    }

    pub fn analyze_symptoms<S: AsRef<str>>(&self, symptoms: &[S]) -> DiagnosisResult {
        self.matcher.analyze_symptoms(symptoms)
    }

    pub fn suggest_tests<S: AsRef<str>>(&self, symptoms: &[S], age: u32, gender: &str) -> Vec<String> {
        symptoms::suggest_tests(symptoms, age, gender)
    }

    pub fn check_interactions(&self, medications: &[MedicationEntry]) -> InteractionResult {
        interactions::check_interactions(medications)
    }

    pub fn suggest_alternatives(&self, medication: &str, reason: &str) -> Vec<Alternative> {
        interactions::suggest_alternatives(medication, reason)
    }
}

#[cfg(test)]
mod tests {
    use carebase_contracts::advisory::{Condition, MedicationEntry, Triage};

    use super::*;

    #[test]
    fn advisor_without_table_still_answers() {
        let advisor = Advisor::from_table_path(Path::new("/nonexistent/symptoms.json"));

        assert_eq!(advisor.symptom_count(), 0);
        let result = advisor.analyze_symptoms(&["fever"]);
        assert!(result.possible_diagnoses.is_empty());
        assert_eq!(result.recommendation, Triage::NoMatch.message());
        assert_eq!(advisor.suggest_tests(&["fever"], 30, "female"), ["Complete Blood Count (CBC)"]);
    }

    #[test]
    fn advisor_delegates_to_both_parts() {
        let advisor = Advisor::new(SymptomTable::from_entries([(
            "fever".to_string(),
            vec![Condition::new("Influenza", 0.7, 4)],
        )]));

        assert_eq!(advisor.analyze_symptoms(&["fever"]).possible_diagnoses.len(), 1);
        let meds = [MedicationEntry::named("fluoxetine"), MedicationEntry::named("tramadol")];
        assert_eq!(advisor.check_interactions(&meds).interactions.len(), 1);
        assert_eq!(advisor.suggest_alternatives("atorvastatin", "side effects").len(), 2);
    }
}

//! Symptom matching and test suggestion.

use tracing::debug;

use carebase_contracts::advisory::{Condition, DiagnosisResult, Triage};

use crate::tables::{SymptomTable, DEFAULT_TESTS, TEST_RULES};

/// Attached to every diagnosis result.
pub const DIAGNOSIS_DISCLAIMER: &str =
    "This is an AI-assisted suggestion and not a medical diagnosis. Please consult with a healthcare professional.";

/// How many conditions a diagnosis result reports.
pub const MAX_DIAGNOSES: usize = 3;

/// Maps reported symptoms to candidate conditions using a `SymptomTable`.
#[derive(Debug, Clone, Default)]
pub struct SymptomMatcher {
    table: SymptomTable,
}

impl SymptomMatcher {
    pub fn new(table: SymptomTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SymptomTable {
        &self.table
    }

    /// Rank the conditions associated with `symptoms`.
    ///
    /// Unknown symptoms are skipped. Structurally equal conditions reached
    /// through different symptoms are counted once. The recommendation looks
    /// at every matched condition, not only the reported top three.
    pub fn analyze_symptoms<S: AsRef<str>>(&self, symptoms: &[S]) -> DiagnosisResult {
        let mut matched: Vec<Condition> = Vec::new();
        for symptom in symptoms {
            let Some(conditions) = self.table.conditions(symptom.as_ref()) else {
                continue;
            };
            for condition in conditions {
                if !matched.contains(condition) {
                    matched.push(condition.clone());
                }
            }
        }

        // Stable: equal confidences keep first-seen order.
        matched.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

        let triage = Triage::from_max_severity(matched.iter().map(Condition::severity).max());
        debug!(
            symptoms = symptoms.len(),
            matched = matched.len(),
            triage = ?triage,
            "symptoms analyzed"
        );

        matched.truncate(MAX_DIAGNOSES);
        DiagnosisResult {
            possible_diagnoses: matched,
            recommendation: triage.message().to_string(),
            disclaimer: DIAGNOSIS_DISCLAIMER.to_string(),
        }
    }
}

/// Diagnostic tests worth ordering for the reported symptoms.
///
/// Every firing rule contributes its tests in rule order, without
/// de-duplication. When none fires the default pair is returned.
pub fn suggest_tests<S: AsRef<str>>(symptoms: &[S], age: u32, gender: &str) -> Vec<String> {
    let reported: Vec<&str> = symptoms.iter().map(AsRef::as_ref).collect();

    let tests: Vec<String> = TEST_RULES
        .iter()
        .filter(|rule| rule.fires(&reported, age, gender))
        .flat_map(|rule| rule.tests.iter().map(|t| t.to_string()))
        .collect();

    if tests.is_empty() {
        DEFAULT_TESTS.iter().map(|t| t.to_string()).collect()
    } else {
        tests
    }
}

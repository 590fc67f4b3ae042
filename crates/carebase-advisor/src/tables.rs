//! The advisory reference tables.
//!
//! The symptom table is data: it is read once at startup from a JSON file
//! mapping each symptom to its candidate conditions. The test-suggestion,
//! interaction and alternatives tables are compiled in.

use std::{collections::HashMap, path::Path};

use tracing::{info, warn};

use carebase_contracts::advisory::Condition;

// ── Symptom table ─────────────────────────────────────────────────────────────

/// Symptom name (case-sensitive) → candidate conditions, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymptomTable {
    entries: HashMap<String, Vec<Condition>>,
}

impl SymptomTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a JSON file.
    ///
    /// A missing, unreadable or malformed file yields an empty table. The
    /// failure is logged and never surfaced to the caller.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "symptom table unreadable; using empty table");
                return Self::empty();
            }
        };

        match Self::from_json_str(&contents) {
            Ok(table) => {
                info!(path = %path.display(), symptoms = table.len(), "symptom table loaded");
                table
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "symptom table malformed; using empty table");
                Self::empty()
            }
        }
    }

    /// Parse a JSON object of `symptom → [condition, ...]`.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: serde_json::from_str(s)?,
        })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<Condition>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn conditions(&self, symptom: &str) -> Option<&[Condition]> {
        self.entries.get(symptom).map(Vec::as_slice)
    }

    /// Number of distinct symptoms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Test suggestion rules ─────────────────────────────────────────────────────

/// One row of the test-suggestion decision table.
///
/// A rule fires when every present constraint holds. Symptom names are
/// matched exactly.
#[derive(Debug, Clone, Copy)]
pub struct TestRule {
    /// At least one of these symptoms must be reported (ignored when empty).
    pub any_of: &'static [&'static str],
    /// Every one of these symptoms must be reported.
    pub all_of: &'static [&'static str],
    /// The patient must be strictly older than this.
    pub older_than: Option<u32>,
    /// Compared case-insensitively against the patient's gender.
    pub gender: Option<&'static str>,
    pub tests: &'static [&'static str],
}

impl TestRule {
    pub fn fires(&self, symptoms: &[&str], age: u32, gender: &str) -> bool {
        let has = |s: &&str| symptoms.contains(s);
        (self.any_of.is_empty() || self.any_of.iter().any(has))
            && self.all_of.iter().all(has)
            && self.older_than.map_or(true, |min| age > min)
            && self.gender.map_or(true, |g| gender.to_lowercase() == g)
    }
}

pub const COMPLETE_BLOOD_COUNT: &str = "Complete Blood Count (CBC)";
pub const BASIC_METABOLIC_PANEL: &str = "Basic Metabolic Panel";

/// Suggested when no rule fires.
pub const DEFAULT_TESTS: [&str; 2] = [COMPLETE_BLOOD_COUNT, BASIC_METABOLIC_PANEL];

/// Evaluated in order; every firing rule contributes its tests.
pub const TEST_RULES: &[TestRule] = &[
    TestRule {
        any_of: &["fever", "chills"],
        all_of: &[],
        older_than: None,
        gender: None,
        tests: &[COMPLETE_BLOOD_COUNT],
    },
    TestRule {
        any_of: &["chest pain", "shortness of breath"],
        all_of: &[],
        older_than: None,
        gender: None,
        tests: &["ECG/EKG", "Chest X-ray"],
    },
    TestRule {
        any_of: &[],
        all_of: &["headache", "vision changes"],
        older_than: None,
        gender: None,
        tests: &["CT Scan"],
    },
    TestRule {
        any_of: &[],
        all_of: &["urinary problems"],
        older_than: Some(50),
        gender: Some("male"),
        tests: &["PSA Test"],
    },
    TestRule {
        any_of: &[],
        all_of: &["fatigue", "weight loss"],
        older_than: Some(40),
        gender: None,
        tests: &["Comprehensive Metabolic Panel", "Thyroid Function Tests"],
    },
];

// ── Interactions ──────────────────────────────────────────────────────────────

/// Severity reported for every known interaction.
pub const INTERACTION_SEVERITY: &str = "moderate";

/// Known interacting pairs (lower-case names) and their warnings, in the
/// order results are reported.
pub const INTERACTIONS: &[(&str, &str, &str)] = &[
    ("aspirin", "ibuprofen", "May increase risk of bleeding"),
    ("lisinopril", "potassium supplements", "May cause high potassium levels"),
    ("simvastatin", "erythromycin", "May increase risk of muscle damage"),
    ("warfarin", "aspirin", "Increased bleeding risk"),
    ("fluoxetine", "tramadol", "Risk of serotonin syndrome"),
];

// ── Alternatives ──────────────────────────────────────────────────────────────

/// Lower-case medication name → `(alternative, reason)` pairs.
pub const ALTERNATIVES: &[(&str, &[(&str, &str)])] = &[
    (
        "lisinopril",
        &[
            ("losartan", "Different class (ARB instead of ACE inhibitor), may have fewer side effects like cough"),
            ("amlodipine", "Different class (calcium channel blocker), alternative for blood pressure control"),
        ],
    ),
    (
        "atorvastatin",
        &[
            ("rosuvastatin", "Alternative statin, may be more potent at lower doses"),
            ("pravastatin", "Alternative statin, may have fewer drug interactions"),
        ],
    ),
    (
        "ibuprofen",
        &[
            ("acetaminophen", "Different class, may be better for patients with GI concerns"),
            ("naproxen", "Alternative NSAID, longer duration of action"),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_parses_conditions_in_file_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"cough": [{{"name": "Common Cold", "confidence": 0.6, "severity": 2}}, {{"name": "Bronchitis"}}]}}"#
        )
        .unwrap();

        let table = SymptomTable::load(file.path());

        let conditions = table.conditions("cough").unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].name, "Common Cold");
        assert_eq!(conditions[1].confidence(), 0.0);
        assert_eq!(conditions[1].severity(), 1);
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let table = SymptomTable::load(Path::new("/nonexistent/symptoms.json"));
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_file_yields_empty_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(SymptomTable::load(file.path()).is_empty());

        let mut wrong_shape = tempfile::NamedTempFile::new().unwrap();
        write!(wrong_shape, r#"["fever", "cough"]"#).unwrap();
        assert!(SymptomTable::load(wrong_shape.path()).is_empty());
    }

    #[test]
    fn symptom_lookup_is_case_sensitive() {
        let table = SymptomTable::from_entries([(
            "fever".to_string(),
            vec![Condition::new("Influenza", 0.7, 4)],
        )]);
        assert!(table.conditions("fever").is_some());
        assert!(table.conditions("Fever").is_none());
    }

    #[test]
    fn shipped_symptom_table_parses() {
        let contents = include_str!("../../../data/symptoms.json");
        let table = SymptomTable::from_json_str(contents).unwrap();
        assert!(!table.is_empty());
    }

    #[test]
    fn interaction_pairs_are_lower_case() {
        for (a, b, _) in INTERACTIONS {
            assert_eq!(*a, a.to_lowercase());
            assert_eq!(*b, b.to_lowercase());
        }
    }
}

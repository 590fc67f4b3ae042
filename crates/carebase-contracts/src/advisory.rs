//! Input and output types of the advisory helpers.
//!
//! These are plain data. The matching rules themselves live in
//! `carebase-advisor`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Confidence assumed when a condition record does not carry one.
pub const DEFAULT_CONFIDENCE: f64 = 0.0;
/// Severity assumed when a condition record does not carry one.
pub const DEFAULT_SEVERITY: i64 = 1;

/// A candidate diagnosis loaded from the symptom table.
///
/// Equality is structural over every field present in the source record,
/// including fields this crate does not interpret. A record without a
/// `confidence` is therefore not equal to one with `confidence: 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// 1 (mild) to 10 (critical).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Condition {
    pub fn new(name: impl Into<String>, confidence: f64, severity: i64) -> Self {
        Self {
            name: name.into(),
            confidence: Some(confidence),
            severity: Some(severity),
            extra: Map::new(),
        }
    }

    /// Ranking score, `DEFAULT_CONFIDENCE` when absent.
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }

    /// Triage severity, `DEFAULT_SEVERITY` when absent.
    pub fn severity(&self) -> i64 {
        self.severity.unwrap_or(DEFAULT_SEVERITY)
    }
}

/// Triage level derived from the most severe matched condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Triage {
    /// Nothing in the symptom table matched.
    NoMatch,
    /// Severity 8 and above.
    Urgent,
    /// Severity 5 to 7.
    Prompt,
    /// Severity below 5.
    Routine,
}

impl Triage {
    /// Severity at or above which care is urgent.
    pub const URGENT_SEVERITY: i64 = 8;
    /// Severity at or above which a consultation within two days is advised.
    pub const PROMPT_SEVERITY: i64 = 5;

    /// Classify the highest severity among matched conditions.
    pub fn from_max_severity(severity: Option<i64>) -> Self {
        match severity {
            None => Self::NoMatch,
            Some(s) if s >= Self::URGENT_SEVERITY => Self::Urgent,
            Some(s) if s >= Self::PROMPT_SEVERITY => Self::Prompt,
            Some(_) => Self::Routine,
        }
    }

    /// Patient-facing recommendation text.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoMatch => {
                "No matching conditions found. Please consult with a healthcare professional for proper diagnosis."
            }
            Self::Urgent => {
                "Urgent medical attention recommended. Please seek immediate medical care."
            }
            Self::Prompt => "Medical consultation recommended within 24-48 hours.",
            Self::Routine => {
                "Monitor symptoms and schedule a routine appointment if symptoms persist."
            }
        }
    }
}

/// Result of matching reported symptoms against the symptom table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// At most three conditions, highest confidence first.
    pub possible_diagnoses: Vec<Condition>,
    pub recommendation: String,
    pub disclaimer: String,
}

/// One medication as handed to the interaction checker.
///
/// Only `name` is interpreted. An entry without a name fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MedicationEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: None,
            extra: Map::new(),
        }
    }
}

/// A known interaction between two of the checked medications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// The interacting pair, in table order.
    pub medications: [String; 2],
    pub severity: String,
    pub warning: String,
}

/// Result of an interaction check over a medication list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResult {
    pub interactions: Vec<InteractionRecord>,
    pub recommendation: String,
    pub disclaimer: String,
}

/// A substitute medication and why it might be chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    pub reason: String,
}

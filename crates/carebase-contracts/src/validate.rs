//! Request validation schema and report types.
//!
//! Before a request body is decoded into a record type, the validator runs it
//! against a `RequestSchema`. Only a passing `ValidationReport` lets the
//! request reach the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structural schema plus business rules for one kind of request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSchema {
    /// Unique identifier for this schema (e.g. `"patient-create-v1"`).
    pub schema_id: String,
    /// A JSON Schema document used for structural validation.
    pub json_schema: Value,
    /// Additional rules evaluated after structural validation.
    pub rules: Vec<ValidationRule>,
}

/// A single semantic rule applied to a request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Identifier referenced in failure reports.
    pub rule_id: String,
    /// Human-readable description for the logs.
    pub description: String,
    /// The check to apply.
    pub rule_type: ValidationRuleType,
}

/// The kinds of semantic checks the validator supports.
///
/// `Custom` lets the HTTP layer hook in record-specific logic by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationRuleType {
    /// The field at `field_path` must be present and non-null.
    RequiredField {
        /// Dotted path, e.g. `"medications.0.name"`.
        field_path: String,
    },

    /// The field at `field_path`, when present, must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// The string at `field_path` must not contain `pattern`.
    ForbiddenPattern {
        field_path: String,
        pattern: String,
    },

    /// Delegate to a named function registered with the validator.
    Custom {
        function_name: String,
    },
}

/// The result of running a `RequestSchema` against a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if every check passed.
    pub passed: bool,
    /// All failures collected during the run. Empty on pass.
    pub failures: Vec<ValidationFailure>,
}

/// A single failed check within a `ValidationReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// The `rule_id` of the failed rule, or `"json-schema"` for structure.
    pub rule_id: String,
    /// Why the rule failed.
    pub message: String,
}

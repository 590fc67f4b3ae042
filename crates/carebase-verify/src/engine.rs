//! Schema-based request validator.
//!
//! Validation runs in two phases:
//!
//! 1. **Structural**: the body is validated against
//!    `RequestSchema::json_schema` using the `jsonschema` crate.
//! 2. **Semantic**: each `ValidationRule` in `RequestSchema::rules` is
//!    evaluated in order. All failures are collected before returning so the
//!    caller sees every problem with the body at once.
//!
//! Custom rules delegate to named functions registered via `register_rule`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use carebase_contracts::{
    error::CarebaseResult,
    validate::{RequestSchema, ValidationFailure, ValidationReport, ValidationRuleType},
};
use carebase_core::traits::RequestValidator;

/// A caller-supplied check over the whole body.
///
/// Returns `Some(message)` when the check fails, `None` on success.
pub type CustomRuleFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// JSON Schema plus semantic rules.
pub struct SchemaValidator {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl SchemaValidator {
    /// Create a validator with no custom rules registered.
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom check under `name`.
    ///
    /// The name must match the `function_name` of `ValidationRuleType::Custom`
    /// rules. Registering the same name twice replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Resolve a dot-notation path (e.g. `"medications.0.name"`). Numeric
    /// segments index into arrays. Returns `None` when any segment is missing
    /// or the value is JSON `null`.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            let next = match current {
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => current.get(segment),
            };
            match next {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestValidator for SchemaValidator {
    fn validate(&self, payload: &Value, schema: &RequestSchema) -> CarebaseResult<ValidationReport> {
        let mut failures: Vec<ValidationFailure> = Vec::new();

        // ── Phase 1: JSON Schema structural validation ────────────────────────
        //
        // A null json_schema means "no structural constraint".
        if !schema.json_schema.is_null() {
            match jsonschema::validator_for(&schema.json_schema) {
                Ok(validator) => {
                    for error in validator.iter_errors(payload) {
                        let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                        warn!(schema_id = %schema.schema_id, %message, "structural validation failure");
                        failures.push(ValidationFailure {
                            rule_id: "json-schema".to_string(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    let message = format!("invalid JSON Schema document: {e}");
                    warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                    failures.push(ValidationFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    });
                }
            }
        }

        // ── Phase 2: Semantic rule evaluation ────────────────────────────────
        for rule in &schema.rules {
            debug!(
                rule_id = %rule.rule_id,
                description = %rule.description,
                "evaluating validation rule"
            );

            let failure_msg: Option<String> = match &rule.rule_type {
                ValidationRuleType::RequiredField { field_path } => {
                    if Self::resolve_path(payload, field_path).is_none() {
                        Some(format!("required field '{field_path}' is missing or null"))
                    } else {
                        None
                    }
                }

                // Absent fields pass: update bodies only carry what changes.
                ValidationRuleType::AllowedValues { field_path, allowed } => {
                    match Self::resolve_path(payload, field_path) {
                        Some(actual) if !allowed.contains(actual) => Some(format!(
                            "field '{field_path}' has value {actual} which is not in the allowed set"
                        )),
                        _ => None,
                    }
                }

                // Only string values are checked.
                ValidationRuleType::ForbiddenPattern { field_path, pattern } => {
                    match Self::resolve_path(payload, field_path).and_then(Value::as_str) {
                        Some(s) if s.contains(pattern.as_str()) => Some(format!(
                            "field '{field_path}' contains forbidden pattern '{pattern}'"
                        )),
                        _ => None,
                    }
                }

                // An unregistered name is itself a failure.
                ValidationRuleType::Custom { function_name } => {
                    match self.custom_rules.get(function_name.as_str()) {
                        Some(f) => f(payload),
                        None => Some(format!(
                            "no custom rule registered for function name '{function_name}'"
                        )),
                    }
                }
            };

            if let Some(message) = failure_msg {
                warn!(rule_id = %rule.rule_id, %message, "semantic rule failed");
                failures.push(ValidationFailure {
                    rule_id: rule.rule_id.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(
            schema_id = %schema.schema_id,
            passed,
            failure_count = failures.len(),
            "validation complete"
        );

        Ok(ValidationReport { passed, failures })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use carebase_contracts::validate::{RequestSchema, ValidationRule, ValidationRuleType};
    use carebase_core::traits::RequestValidator;

    use super::SchemaValidator;

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn make_schema(json_schema: Value, rules: Vec<ValidationRule>) -> RequestSchema {
        RequestSchema {
            schema_id: "test-schema-v1".to_string(),
            json_schema,
            rules,
        }
    }

    fn rule(id: &str, rule_type: ValidationRuleType) -> ValidationRule {
        ValidationRule {
            rule_id: id.to_string(),
            description: format!("test rule {id}"),
            rule_type,
        }
    }

    fn patient_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "first_name": { "type": "string" },
                "last_name": { "type": "string" }
            },
            "required": ["first_name", "last_name"]
        })
    }

    // ── JSON Schema ───────────────────────────────────────────────────────────

    #[test]
    fn test_schema_pass() {
        let validator = SchemaValidator::new();
        let schema = make_schema(patient_schema(), vec![]);

        let report = validator
            .validate(&json!({ "first_name": "Ada", "last_name": "Lovelace" }), &schema)
            .unwrap();

        assert!(report.passed, "expected pass, failures: {:?}", report.failures);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_schema_fail_collects_every_violation() {
        let validator = SchemaValidator::new();
        let schema = make_schema(patient_schema(), vec![]);

        let report = validator.validate(&json!({ "first_name": 3 }), &schema).unwrap();

        assert!(!report.passed);
        assert!(report.failures.len() >= 2, "got {:?}", report.failures);
        assert!(report.failures.iter().all(|f| f.rule_id == "json-schema"));
    }

    #[test]
    fn test_invalid_schema_document_is_a_failure() {
        let validator = SchemaValidator::new();
        let schema = make_schema(json!({ "type": "no-such-type" }), vec![]);

        let report = validator.validate(&json!({}), &schema).unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
    }

    // ── RequiredField ─────────────────────────────────────────────────────────

    #[test]
    fn test_required_field_through_array_index() {
        let validator = SchemaValidator::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "first-medication-named",
                ValidationRuleType::RequiredField {
                    field_path: "medications.0.name".to_string(),
                },
            )],
        );

        let ok = validator
            .validate(&json!({ "medications": [{ "name": "aspirin" }] }), &schema)
            .unwrap();
        assert!(ok.passed, "failures: {:?}", ok.failures);

        let missing = validator
            .validate(&json!({ "medications": [{ "dosage": "5mg" }] }), &schema)
            .unwrap();
        assert!(!missing.passed);
        assert_eq!(missing.failures[0].rule_id, "first-medication-named");
        assert!(missing.failures[0].message.contains("medications.0.name"));
    }

    #[test]
    fn test_required_field_null_counts_as_missing() {
        let validator = SchemaValidator::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "req-email",
                ValidationRuleType::RequiredField { field_path: "email".to_string() },
            )],
        );

        let report = validator.validate(&json!({ "email": null }), &schema).unwrap();
        assert!(!report.passed);
    }

    // ── AllowedValues ─────────────────────────────────────────────────────────

    fn status_rule() -> ValidationRule {
        rule(
            "appointment-status",
            ValidationRuleType::AllowedValues {
                field_path: "status".to_string(),
                allowed: vec![json!("scheduled"), json!("completed"), json!("cancelled")],
            },
        )
    }

    #[test]
    fn test_allowed_values() {
        let validator = SchemaValidator::new();
        let schema = make_schema(Value::Null, vec![status_rule()]);

        assert!(validator.validate(&json!({ "status": "completed" }), &schema).unwrap().passed);

        let report = validator.validate(&json!({ "status": "postponed" }), &schema).unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "appointment-status");
    }

    #[test]
    fn test_allowed_values_absent_field_passes() {
        let validator = SchemaValidator::new();
        let schema = make_schema(Value::Null, vec![status_rule()]);

        assert!(validator.validate(&json!({ "notes": "moved" }), &schema).unwrap().passed);
    }

    // ── ForbiddenPattern ──────────────────────────────────────────────────────

    #[test]
    fn test_forbidden_pattern_detected() {
        let validator = SchemaValidator::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "no-traversal",
                ValidationRuleType::ForbiddenPattern {
                    field_path: "avatar_url".to_string(),
                    pattern: "..".to_string(),
                },
            )],
        );

        let report = validator
            .validate(&json!({ "avatar_url": "../../etc/passwd" }), &schema)
            .unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains(".."));

        // Non-string values are not checked.
        assert!(validator.validate(&json!({ "avatar_url": 7 }), &schema).unwrap().passed);
    }

    // ── Custom ────────────────────────────────────────────────────────────────

    #[test]
    fn test_custom_rule_pass_and_fail() {
        let mut validator = SchemaValidator::new();
        validator.register_rule(
            "passwords-match",
            Box::new(|body| {
                (body.get("password") != body.get("password_confirm"))
                    .then(|| "passwords do not match".to_string())
            }),
        );
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "passwords-match",
                ValidationRuleType::Custom {
                    function_name: "passwords-match".to_string(),
                },
            )],
        );

        let ok = validator
            .validate(&json!({ "password": "a", "password_confirm": "a" }), &schema)
            .unwrap();
        assert!(ok.passed);

        let bad = validator
            .validate(&json!({ "password": "a", "password_confirm": "b" }), &schema)
            .unwrap();
        assert!(!bad.passed);
        assert_eq!(bad.failures[0].message, "passwords do not match");
    }

    #[test]
    fn test_unregistered_custom_rule() {
        let validator = SchemaValidator::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "phantom-check",
                ValidationRuleType::Custom {
                    function_name: "does-not-exist".to_string(),
                },
            )],
        );

        let report = validator.validate(&json!({}), &schema).unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "phantom-check");
        assert!(report.failures[0].message.contains("does-not-exist"));
    }

    #[test]
    fn test_structural_and_semantic_failures_accumulate() {
        let validator = SchemaValidator::new();
        let schema = make_schema(patient_schema(), vec![status_rule()]);

        let report = validator
            .validate(&json!({ "first_name": "Ada", "status": "unknown" }), &schema)
            .unwrap();

        let ids: Vec<&str> = report.failures.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["json-schema", "appointment-status"]);
    }
}

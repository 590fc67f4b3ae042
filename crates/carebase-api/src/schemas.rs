//! Request schemas for every JSON body the API accepts, plus the custom
//! rules they reference.

use serde_json::{json, Value};

use carebase_contracts::validate::{RequestSchema, ValidationRule, ValidationRuleType};
use carebase_verify::SchemaValidator;

pub const PASSWORDS_MATCH: &str = "passwords-match";
pub const EMAIL_FORMAT: &str = "email-format";

/// Register the custom rules named by [`RequestSchemas`].
pub fn register_rules(validator: &mut SchemaValidator) {
    validator.register_rule(
        PASSWORDS_MATCH,
        Box::new(|payload: &Value| {
            if payload.get("password") == payload.get("password_confirm") {
                None
            } else {
                Some("Passwords do not match".to_string())
            }
        }),
    );
    validator.register_rule(
        EMAIL_FORMAT,
        Box::new(|payload: &Value| match payload.get("email").and_then(Value::as_str) {
            Some(email) if !looks_like_email(email) => {
                Some(format!("'{email}' is not a valid email address"))
            }
            _ => None,
        }),
    );
}

/// `local@domain.tld` with no whitespace.
pub fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub struct RequestSchemas {
    pub register: RequestSchema,
    pub login: RequestSchema,
    pub user_update: RequestSchema,
    pub patient_create: RequestSchema,
    pub patient_update: RequestSchema,
    pub appointment_create: RequestSchema,
    pub appointment_update: RequestSchema,
    pub prescription_create: RequestSchema,
    pub prescription_update: RequestSchema,
    pub advisor_symptoms: RequestSchema,
    pub advisor_tests: RequestSchema,
    pub advisor_interactions: RequestSchema,
    pub advisor_alternatives: RequestSchema,
}

impl Default for RequestSchemas {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSchemas {
    pub fn new() -> Self {
        Self {
            register: schema(
                "user-register",
                json!({
                    "type": "object",
                    "required": ["email", "full_name", "password", "password_confirm"],
                    "properties": {
                        "email": { "type": "string" },
                        "full_name": { "type": "string", "minLength": 1 },
                        "password": { "type": "string", "minLength": 1 },
                        "password_confirm": { "type": "string" },
                        "is_active": { "type": "boolean" },
                        "avatar_url": { "type": ["string", "null"] }
                    }
                }),
                vec![email_rule(), passwords_rule()],
            ),
            login: schema(
                "auth-login",
                json!({
                    "type": "object",
                    "required": ["email", "password"],
                    "properties": {
                        "email": { "type": "string" },
                        "password": { "type": "string" },
                        "remember_me": { "type": "boolean" }
                    }
                }),
                Vec::new(),
            ),
            user_update: schema(
                "user-update",
                json!({
                    "type": "object",
                    "properties": {
                        "email": { "type": "string" },
                        "full_name": { "type": "string", "minLength": 1 },
                        "password": { "type": "string", "minLength": 1 },
                        "is_active": { "type": "boolean" },
                        "is_admin": { "type": "boolean" },
                        "avatar_url": { "type": ["string", "null"] }
                    }
                }),
                vec![email_rule()],
            ),
            patient_create: schema(
                "patient-create",
                patient_json(&["first_name", "last_name", "date_of_birth", "gender", "phone_number"]),
                vec![email_rule()],
            ),
            patient_update: schema("patient-update", patient_json(&[]), vec![email_rule()]),
            appointment_create: schema(
                "appointment-create",
                appointment_json(&["patient_id", "doctor_id", "appointment_date", "reason"]),
                vec![status_rule()],
            ),
            appointment_update: schema(
                "appointment-update",
                appointment_json(&[]),
                vec![status_rule()],
            ),
            prescription_create: schema(
                "prescription-create",
                json!({
                    "type": "object",
                    "required": ["patient_id", "diagnosis", "medications"],
                    "properties": {
                        "patient_id": { "type": "string", "minLength": 1 },
                        "doctor_id": { "type": ["string", "null"] },
                        "diagnosis": { "type": "string" },
                        "notes": { "type": ["string", "null"] },
                        "file_url": { "type": ["string", "null"] },
                        "medications": medications_json()
                    }
                }),
                Vec::new(),
            ),
            prescription_update: schema(
                "prescription-update",
                json!({
                    "type": "object",
                    "properties": {
                        "diagnosis": { "type": "string" },
                        "notes": { "type": ["string", "null"] },
                        "file_url": { "type": ["string", "null"] },
                        "medications": medications_json()
                    }
                }),
                Vec::new(),
            ),
            advisor_symptoms: schema(
                "advisor-symptoms",
                json!({
                    "type": "object",
                    "required": ["symptoms"],
                    "properties": {
                        "symptoms": { "type": "array", "items": { "type": "string" } }
                    }
                }),
                Vec::new(),
            ),
            advisor_tests: schema(
                "advisor-tests",
                json!({
                    "type": "object",
                    "required": ["symptoms", "age", "gender"],
                    "properties": {
                        "symptoms": { "type": "array", "items": { "type": "string" } },
                        "age": { "type": "integer", "minimum": 0 },
                        "gender": { "type": "string" }
                    }
                }),
                Vec::new(),
            ),
            advisor_interactions: schema(
                "advisor-interactions",
                json!({
                    "type": "object",
                    "required": ["medications"],
                    "properties": {
                        "medications": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["name"],
                                "properties": { "name": { "type": "string" } }
                            }
                        }
                    }
                }),
                Vec::new(),
            ),
            advisor_alternatives: schema(
                "advisor-alternatives",
                json!({
                    "type": "object",
                    "required": ["medication"],
                    "properties": {
                        "medication": { "type": "string" },
                        "reason": { "type": "string" }
                    }
                }),
                Vec::new(),
            ),
        }
    }
}

fn schema(id: &str, json_schema: Value, rules: Vec<ValidationRule>) -> RequestSchema {
    RequestSchema {
        schema_id: id.to_string(),
        json_schema,
        rules,
    }
}

fn email_rule() -> ValidationRule {
    ValidationRule {
        rule_id: "email-format".to_string(),
        description: "email, when present, must look like local@domain.tld".to_string(),
        rule_type: ValidationRuleType::Custom {
            function_name: EMAIL_FORMAT.to_string(),
        },
    }
}

fn passwords_rule() -> ValidationRule {
    ValidationRule {
        rule_id: "passwords-match".to_string(),
        description: "password and password_confirm must be identical".to_string(),
        rule_type: ValidationRuleType::Custom {
            function_name: PASSWORDS_MATCH.to_string(),
        },
    }
}

fn status_rule() -> ValidationRule {
    ValidationRule {
        rule_id: "appointment-status".to_string(),
        description: "status must be scheduled, completed or cancelled".to_string(),
        rule_type: ValidationRuleType::AllowedValues {
            field_path: "status".to_string(),
            allowed: vec![json!("scheduled"), json!("completed"), json!("cancelled")],
        },
    }
}

fn patient_json(required: &[&str]) -> Value {
    let schema = json!({
        "type": "object",
        "properties": {
            "first_name": { "type": "string", "minLength": 1 },
            "last_name": { "type": "string", "minLength": 1 },
            "date_of_birth": { "type": "string" },
            "gender": { "type": "string" },
            "phone_number": { "type": "string" },
            "address": { "type": ["string", "null"] },
            "email": { "type": ["string", "null"] },
            "blood_type": { "type": ["string", "null"] },
            "allergies": { "type": ["string", "null"] },
            "medical_history": { "type": ["string", "null"] }
        }
    });
    with_required(schema, required)
}

fn appointment_json(required: &[&str]) -> Value {
    let schema = json!({
        "type": "object",
        "properties": {
            "patient_id": { "type": "string", "minLength": 1 },
            "doctor_id": { "type": "string", "minLength": 1 },
            "appointment_date": { "type": "string" },
            "reason": { "type": "string" },
            "status": { "type": "string" },
            "notes": { "type": ["string", "null"] }
        }
    });
    with_required(schema, required)
}

/// Update bodies have no required fields; omit the keyword entirely then.
fn with_required(mut schema: Value, required: &[&str]) -> Value {
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn medications_json() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["name", "dosage", "frequency", "duration"],
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "dosage": { "type": "string" },
                "frequency": { "type": "string" },
                "duration": { "type": "string" },
                "instructions": { "type": ["string", "null"] }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use carebase_core::traits::RequestValidator;

    use super::*;

    fn validator() -> SchemaValidator {
        let mut v = SchemaValidator::new();
        register_rules(&mut v);
        v
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("ann@clinic.test"));
        assert!(!looks_like_email("ann@clinic"));
        assert!(!looks_like_email("@clinic.test"));
        assert!(!looks_like_email("ann clinic@x.test"));
        assert!(!looks_like_email("a@b@c.test"));
        assert!(!looks_like_email("ann@.test"));
    }

    #[test]
    fn register_rejects_mismatched_passwords() {
        let report = validator()
            .validate(
                &json!({
                    "email": "ann@clinic.test",
                    "full_name": "Ann",
                    "password": "one",
                    "password_confirm": "two"
                }),
                &RequestSchemas::new().register,
            )
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule_id, "passwords-match");
    }

    #[test]
    fn register_collects_every_failure() {
        let report = validator()
            .validate(
                &json!({
                    "email": "not-an-email",
                    "full_name": "Ann",
                    "password": "one",
                    "password_confirm": "two"
                }),
                &RequestSchemas::new().register,
            )
            .unwrap();
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn appointment_status_outside_set_fails() {
        let report = validator()
            .validate(&json!({ "status": "postponed" }), &RequestSchemas::new().appointment_update)
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "appointment-status");
    }

    #[test]
    fn empty_medication_list_is_accepted() {
        let report = validator()
            .validate(
                &json!({ "patient_id": "p-1", "diagnosis": "Flu", "medications": [] }),
                &RequestSchemas::new().prescription_create,
            )
            .unwrap();
        assert!(report.passed);
    }

    #[test]
    fn interaction_entry_without_name_fails() {
        let report = validator()
            .validate(
                &json!({ "medications": [{ "name": "Aspirin" }, { "dosage": "5 mg" }] }),
                &RequestSchemas::new().advisor_interactions,
            )
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
    }
}

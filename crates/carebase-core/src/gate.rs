//! The request gatekeeper: the fixed order every mutating request follows.
//!
//!   Principal → Policy → Validate → Decode → (handler)
//!
//! A payload is never inspected unless the policy returned `Allow` for the
//! principal, and never decoded into a record type unless every validation
//! rule passed. The code path to `decode` is only reachable after both gates.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use carebase_contracts::{
    access::{AccessContext, AccessVerdict},
    auth::Principal,
    error::{CarebaseError, CarebaseResult},
    validate::RequestSchema,
};

use crate::traits::{AccessPolicy, RequestValidator};

/// Owns the trusted access policy and request validator for the service.
///
/// One gatekeeper is shared by all handlers.
pub struct Gatekeeper {
    policy: Box<dyn AccessPolicy>,
    validator: Box<dyn RequestValidator>,
}

impl Gatekeeper {
    pub fn new(policy: Box<dyn AccessPolicy>, validator: Box<dyn RequestValidator>) -> Self {
        Self { policy, validator }
    }

    /// Ask the policy whether `principal` may perform `action` on `resource`.
    ///
    /// # Errors
    ///
    /// `AccessDenied` when the policy denies, or whatever the policy itself
    /// returns when it cannot evaluate.
    pub fn authorize(&self, principal: &Principal, action: &str, resource: &str) -> CarebaseResult<()> {
        let ctx = AccessContext {
            principal_id: principal.user_id.clone(),
            action: action.to_string(),
            resource: resource.to_string(),
            capabilities: principal.capabilities.names(),
        };

        match self.policy.evaluate(&ctx)? {
            AccessVerdict::Allow => {
                debug!(
                    principal = %principal.user_id,
                    action = %action,
                    resource = %resource,
                    "access allowed"
                );
                Ok(())
            }
            AccessVerdict::Deny { reason } => {
                warn!(
                    principal = %principal.user_id,
                    action = %action,
                    resource = %resource,
                    reason = %reason,
                    "access denied"
                );
                Err(CarebaseError::AccessDenied { reason })
            }
        }
    }

    /// Run `payload` through the validator.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` carrying one `[rule] message` entry per failure.
    pub fn validate(&self, payload: &Value, schema: &RequestSchema) -> CarebaseResult<()> {
        let report = self.validator.validate(payload, schema)?;
        if report.passed {
            return Ok(());
        }

        let failures: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect();

        warn!(
            schema = %schema.schema_id,
            failures = %failures.join("; "),
            "request validation failed"
        );
        Err(CarebaseError::ValidationFailed { failures })
    }

    /// Authorize, validate, then decode `payload` into `T`.
    pub fn admit<T: DeserializeOwned>(
        &self,
        principal: &Principal,
        action: &str,
        resource: &str,
        payload: Value,
        schema: &RequestSchema,
    ) -> CarebaseResult<T> {
        self.authorize(principal, action, resource)?;
        self.validate(&payload, schema)?;
        decode(payload)
    }
}

/// Decode a validated JSON body into its typed form.
///
/// # Errors
///
/// `ValidationFailed` with the serde message when the shape does not match.
pub fn decode<T: DeserializeOwned>(payload: Value) -> CarebaseResult<T> {
    serde_json::from_value(payload).map_err(|e| CarebaseError::ValidationFailed {
        failures: vec![format!("[decode] {e}")],
    })
}

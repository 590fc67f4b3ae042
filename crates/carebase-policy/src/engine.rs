//! TOML-driven access policy implementation.
//!
//! Evaluation algorithm:
//!
//! 1. Iterate rules in declaration order.
//! 2. For the first rule whose `action` and `resource` patterns match:
//!    a. Verify the principal holds every capability listed in
//!       `required_capabilities`. If any are missing → `Deny`.
//!    b. Convert `RuleVerdict` → `AccessVerdict` and return.
//! 3. If no rule matched → `Deny` with "denied by default".

use std::path::Path;

use tracing::{debug, warn};

use carebase_contracts::{
    access::{AccessContext, AccessVerdict},
    error::{CarebaseError, CarebaseResult},
};
use carebase_core::traits::AccessPolicy;

use crate::rule::{PolicyConfig, RuleVerdict};

/// The policy shipped with the service.
pub const EMBEDDED_POLICY: &str = include_str!("../policies/access.toml");

/// An `AccessPolicy` that reads its rules from a TOML document.
#[derive(Debug)]
pub struct TomlPolicyEngine {
    config: PolicyConfig,
}

impl TomlPolicyEngine {
    /// Parse `s` as TOML and build a `TomlPolicyEngine`.
    ///
    /// Returns `CarebaseError::Config` if the TOML is malformed or does not
    /// match the `PolicyConfig` schema.
    pub fn from_toml_str(s: &str) -> CarebaseResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| CarebaseError::Config {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as a policy.
    pub fn from_file(path: &Path) -> CarebaseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CarebaseError::Config {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The built-in policy from `policies/access.toml`.
    pub fn embedded() -> CarebaseResult<Self> {
        Self::from_toml_str(EMBEDDED_POLICY)
    }

    /// Number of loaded rules.
    pub fn rule_count(&self) -> usize {
        self.config.rules.len()
    }
}

impl AccessPolicy for TomlPolicyEngine {
    fn evaluate(&self, ctx: &AccessContext) -> CarebaseResult<AccessVerdict> {
        debug!(
            principal = %ctx.principal_id,
            action = %ctx.action,
            resource = %ctx.resource,
            "evaluating policy"
        );

        for rule in &self.config.rules {
            if !rule.matches(&ctx.action, &ctx.resource) {
                continue;
            }

            debug!(rule_id = %rule.id, "rule matched");

            for required_cap in &rule.required_capabilities {
                if !ctx.capabilities.contains(required_cap) {
                    warn!(
                        rule_id = %rule.id,
                        capability = %required_cap,
                        principal = %ctx.principal_id,
                        "matched rule requires capability principal does not hold"
                    );
                    return Ok(AccessVerdict::Deny {
                        reason: format!(
                            "rule '{}' requires capability '{}' which is not granted",
                            rule.id, required_cap
                        ),
                    });
                }
            }

            let verdict = match rule.verdict {
                RuleVerdict::Allow => AccessVerdict::Allow,
                RuleVerdict::Deny => AccessVerdict::Deny {
                    reason: rule
                        .deny_reason
                        .clone()
                        .unwrap_or_else(|| format!("denied by rule '{}'", rule.id)),
                },
            };

            return Ok(verdict);
        }

        warn!(
            action = %ctx.action,
            resource = %ctx.resource,
            principal = %ctx.principal_id,
            "no policy rule matched; denying by default"
        );

        Ok(AccessVerdict::Deny {
            reason: format!(
                "denied by default: no policy rule matched action '{}' on resource '{}'",
                ctx.action, ctx.resource
            ),
        })
    }
}

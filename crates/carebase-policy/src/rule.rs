//! Policy rule types and configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML and holds an ordered list of
//! `PolicyRule`s. Rules are evaluated in declaration order and the first
//! matching rule wins. If no rule matches, the engine denies by default.

use serde::{Deserialize, Serialize};

/// The decision a rule produces when it matches.
///
/// ```toml
/// verdict = "allow"
/// verdict = "deny"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleVerdict {
    Allow,
    Deny,
}

/// A single policy rule loaded from TOML.
///
/// Both `action` and `resource` support the wildcard `"*"`, which matches
/// any string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Stable identifier used in logs and deny reasons.
    pub id: String,

    pub description: String,

    /// Matched against `AccessContext::action`, e.g. `"create"`.
    pub action: String,

    /// Matched against `AccessContext::resource`, e.g. `"patient"`.
    pub resource: String,

    /// Capabilities the principal must hold for this rule to produce its
    /// verdict. A missing one turns any verdict into a deny.
    #[serde(default)]
    pub required_capabilities: Vec<String>,

    pub verdict: RuleVerdict,

    /// Returned to the caller when `verdict = "deny"`.
    pub deny_reason: Option<String>,
}

impl PolicyRule {
    /// Return true if this rule matches the given `action` and `resource`.
    ///
    /// Exact, case-sensitive comparison unless the rule field is `"*"`.
    pub fn matches(&self, action: &str, resource: &str) -> bool {
        let action_matches = self.action == "*" || self.action == action;
        let resource_matches = self.resource == "*" || self.resource == resource;
        action_matches && resource_matches
    }
}

/// The top-level structure deserialized from a TOML policy file.
///
/// ```toml
/// [[rules]]
/// id = "records-read"
/// description = "Read a single clinical record"
/// action = "read"
/// resource = "*"
/// required_capabilities = ["records:read"]
/// verdict = "allow"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Ordered list of rules. First match wins.
    pub rules: Vec<PolicyRule>,
}

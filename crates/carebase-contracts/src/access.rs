//! Capability-based access control types.
//!
//! A principal may only perform an action if the access policy allows it and
//! the principal holds every capability the matching rule lists. Capabilities
//! are derived from the user's account flags when a request is authenticated
//! and are never elevated during the request.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Held by every active account: read and update one's own user record.
pub const CAP_ACCOUNT_SELF: &str = "account:self";
/// Held by every active account: list and read clinical records.
pub const CAP_RECORDS_READ: &str = "records:read";
/// Held by every active account: create, change and delete clinical records.
pub const CAP_RECORDS_WRITE: &str = "records:write";
/// Held by every active account: call the advisory helpers.
pub const CAP_ADVISOR_USE: &str = "advisor:use";
/// Held by administrators only: manage other user accounts.
pub const CAP_USERS_ADMIN: &str = "users:admin";

/// An opaque capability token, e.g. `"records:read"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Capability(pub String);

impl Capability {
    /// Construct a capability from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// The full set of capabilities held by an authenticated principal.
///
/// Ordered so that the list handed to the policy engine (and written to the
/// logs) is stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    inner: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// The capability set for an account with the given admin flag.
    pub fn for_account(is_admin: bool) -> Self {
        let mut caps = Self::default();
        for name in [CAP_ACCOUNT_SELF, CAP_RECORDS_READ, CAP_RECORDS_WRITE, CAP_ADVISOR_USE] {
            caps.grant(Capability::new(name));
        }
        if is_admin {
            caps.grant(Capability::new(CAP_USERS_ADMIN));
        }
        caps
    }

    /// Grant a capability to this set.
    pub fn grant(&mut self, capability: Capability) {
        self.inner.insert(capability);
    }

    /// Return true if the set contains the given capability.
    pub fn has(&self, capability: &Capability) -> bool {
        self.inner.contains(capability)
    }

    /// Return an iterator over all granted capabilities.
    pub fn all(&self) -> impl Iterator<Item = &Capability> {
        self.inner.iter()
    }

    /// Capability names as plain strings.
    pub fn names(&self) -> Vec<String> {
        self.inner.iter().map(|c| c.0.clone()).collect()
    }
}

/// The decision emitted by the access policy for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessVerdict {
    /// The action is permitted.
    Allow,

    /// The action is refused.
    Deny {
        /// Human-readable explanation, logged and returned to the caller.
        reason: String,
    },
}

/// Everything the access policy needs to make a decision.
///
/// All fields are plain strings so policy rules can be written without
/// depending on the record types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessContext {
    /// Id of the authenticated user making the request.
    pub principal_id: String,
    /// The verb being performed, e.g. `"create"`, `"list"`, `"analyze"`.
    pub action: String,
    /// The resource kind it targets, e.g. `"patient"`, `"user"`, `"self"`.
    pub resource: String,
    /// Capability names the principal holds.
    pub capabilities: Vec<String>,
}

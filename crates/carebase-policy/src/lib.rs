//! # carebase-policy
//!
//! A TOML-driven, deny-by-default access policy for the carebase API.
//!
//! [`TomlPolicyEngine`] implements
//! [`AccessPolicy`](carebase_core::traits::AccessPolicy). Rules are declared
//! in TOML, evaluated in order, and the first matching rule wins. If no rule
//! matches, the request is denied.
//!
//! ```rust,ignore
//! use carebase_policy::TomlPolicyEngine;
//!
//! let policy = TomlPolicyEngine::embedded()?;
//! // Pass `policy` to `carebase_core::Gatekeeper::new(...)`.
//! ```

pub mod engine;
pub mod rule;

pub use engine::TomlPolicyEngine;
pub use rule::{PolicyConfig, PolicyRule, RuleVerdict};

// ── Tests ─────────────────────────────────────────────────────────────────────

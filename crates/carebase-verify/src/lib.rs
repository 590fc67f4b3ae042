//! # carebase-verify
//!
//! Request body validation for carebase.
//!
//! [`engine::SchemaValidator`] implements
//! [`carebase_core::traits::RequestValidator`] in two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate.
//! 2. **Semantic**: `RequiredField`, `AllowedValues`, `ForbiddenPattern`
//!    and `Custom` rules evaluated against the body.
//!
//! ```rust,ignore
//! use carebase_verify::SchemaValidator;
//!
//! let mut validator = SchemaValidator::new();
//! validator.register_rule("passwords-match", Box::new(|body| {
//!     (body.get("password") != body.get("password_confirm"))
//!         .then(|| "passwords do not match".to_string())
//! }));
//! ```

pub mod engine;

pub use engine::{CustomRuleFn, SchemaValidator};

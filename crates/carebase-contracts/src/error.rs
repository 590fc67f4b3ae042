//! Service error types.
//!
//! Every fallible operation outside the HTTP layer returns `CarebaseResult<T>`.
//! Variants carry enough context for the HTTP layer to pick a status code and
//! for the logs to say what went wrong.

use thiserror::Error;

/// The unified error type for carebase crates.
#[derive(Debug, Error)]
pub enum CarebaseError {
    /// The access policy denied the requested action.
    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    /// A request payload failed structural or semantic validation.
    ///
    /// `failures` holds one message per failed rule, in evaluation order.
    #[error("validation failed: {}", failures.join("; "))]
    ValidationFailed { failures: Vec<String> },

    /// The addressed record does not exist.
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: String },

    /// The request conflicts with existing state (e.g. duplicate email).
    #[error("{reason}")]
    Conflict { reason: String },

    /// Credentials or a bearer token were missing, wrong or expired.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// The account exists but has been deactivated.
    #[error("inactive user")]
    InactiveUser,

    /// The record store could not complete an operation.
    #[error("store error: {reason}")]
    Store { reason: String },

    /// The object store could not persist an upload.
    #[error("file upload error: {reason}")]
    ObjectStore { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A schema document could not be compiled or applied.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// A local fault unrelated to input or configuration, such as a result
    /// that cannot be rendered.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl CarebaseError {
    /// Shorthand for a `NotFound` on `resource` / `id`.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Shorthand for an `Authentication` failure.
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Shorthand for an `Internal` failure.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Store` failure.
    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store {
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the carebase crates.
pub type CarebaseResult<T> = Result<T, CarebaseError>;

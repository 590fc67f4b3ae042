//! # carebase-api
//!
//! The HTTP surface of carebase: account and token handling, clinical
//! records (patients, appointments, prescriptions), file uploads and the
//! advisory endpoints.
//!
//! Every protected request flows through the same path:
//! bearer token → [`carebase_core::Gatekeeper`] (policy, then schema) →
//! repository → JSON response. Errors map to `{ "error": { code, message } }`
//! bodies through [`ApiError`].

pub mod config;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod schemas;
pub mod server;
pub mod upload;

#[cfg(test)]
mod testing;

pub use config::Settings;
pub use context::ApiContext;
pub use error::ApiError;
pub use router::api_router;
pub use server::run;

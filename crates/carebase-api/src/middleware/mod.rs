//! API middleware.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: every request, including rejected ones
//! 2. Auth: bearer token → `Principal` + `CurrentUser` (protected routes only)

pub mod access_log;
pub mod auth;

//! # carebase-contracts
//!
//! Shared records, advisory types, access and validation contracts for the
//! carebase service.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, constructors and error types.

pub mod access;
pub mod advisory;
pub mod appointment;
pub mod auth;
pub mod error;
pub mod patient;
pub mod prescription;
pub mod store;
pub mod user;
pub mod validate;

/// Generate a fresh primary key for a new row.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

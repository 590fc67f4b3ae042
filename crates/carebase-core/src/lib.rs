//! # carebase-core
//!
//! The trusted request runtime for carebase.
//!
//! This crate provides:
//! - The four boundary traits (`AccessPolicy`, `RequestValidator`,
//!   `RecordStore`, `ObjectStore`)
//! - The `Gatekeeper` that applies policy then validation in a fixed order
//! - `Repository<T>`, typed CRUD over a record store table
//! - Password hashing and the opaque bearer token registry

pub mod credentials;
pub mod gate;
pub mod repository;
pub mod tokens;
pub mod traits;

pub use credentials::PasswordHasher;
pub use gate::Gatekeeper;
pub use repository::Repository;
pub use tokens::TokenRegistry;

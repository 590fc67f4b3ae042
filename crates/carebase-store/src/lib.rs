//! # carebase-store
//!
//! Reference implementations of the storage traits from carebase-core.
//!
//! - [`InMemoryStore`] implements `RecordStore` with insertion-ordered
//!   tables behind a mutex.
//! - [`LocalObjectStore`] implements `ObjectStore` on a local directory whose
//!   contents are served back under a public base URL.

pub mod memory;
pub mod objects;

pub use memory::InMemoryStore;
pub use objects::LocalObjectStore;

//! API endpoint handlers, one module per resource.

pub mod advisor;
pub mod appointments;
pub mod auth;
pub mod health;
pub mod patients;
pub mod prescriptions;
pub mod users;

use serde::Deserialize;

use carebase_contracts::store::{Query, DEFAULT_PAGE_LIMIT};

/// `?skip=&limit=` pagination shared by every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub(crate) fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Page {
    pub fn query(self) -> Query {
        Query::page(self.skip, self.limit)
    }
}

//! Record store query types.
//!
//! These mirror what the hosted relational backend understands: equality and
//! range filters, a case-insensitive substring search across columns, and
//! offset/limit pagination.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Default page size when the caller gives no `limit`.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// A row type that lives in a named table of the record store.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Table name in the backing store.
    const TABLE: &'static str;

    /// Whether the row carries an `updated_at` column to stamp on update.
    const TIMESTAMPED: bool = true;

    /// Primary key of this row.
    fn id(&self) -> &str;
}

/// A single row predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// `field == value`.
    Eq { field: String, value: Value },
    /// `field >= value`.
    Gte { field: String, value: Value },
    /// `field <= value`.
    Lte { field: String, value: Value },
    /// At least one of `fields` contains `needle`, ignoring case.
    ContainsAny { fields: Vec<String>, needle: String },
}

/// Filters plus pagination. All filters must match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Query {
    /// An unfiltered query for the given page.
    pub fn page(offset: usize, limit: usize) -> Self {
        Self {
            filters: Vec::new(),
            offset,
            limit,
        }
    }

    /// Add an equality filter.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add a lower bound (inclusive).
    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add an upper bound (inclusive).
    pub fn lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add a case-insensitive substring search over `fields`.
    pub fn contains_any(mut self, fields: &[&str], needle: impl Into<String>) -> Self {
        self.filters.push(Filter::ContainsAny {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            needle: needle.into(),
        });
        self
    }
}

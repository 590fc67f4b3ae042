//! Core trait definitions for the carebase request pipeline.
//!
//! These four traits mark the boundaries the service trusts:
//!
//! - `AccessPolicy`     decides whether a principal may act on a resource
//! - `RequestValidator` checks request bodies before they are decoded
//! - `RecordStore`      is the hosted relational backend
//! - `ObjectStore`      is the hosted file storage
//!
//! The HTTP layer holds them as trait objects so deployments can swap the
//! in-memory implementations for hosted ones without touching handlers.

use serde_json::Value;

use carebase_contracts::{
    access::{AccessContext, AccessVerdict},
    error::CarebaseResult,
    store::Query,
    validate::{RequestSchema, ValidationReport},
};

/// The access policy: the first gate every authenticated request passes.
///
/// Implementations must be deterministic and fast; they are evaluated on
/// every request.
pub trait AccessPolicy: Send + Sync {
    /// Evaluate whether the described action is permitted.
    fn evaluate(&self, ctx: &AccessContext) -> CarebaseResult<AccessVerdict>;
}

/// The request validator: checks a raw JSON body against a schema.
pub trait RequestValidator: Send + Sync {
    /// Return a report with `passed = true` if all checks pass, or the full
    /// list of failures otherwise. `Err` is reserved for validator faults.
    fn validate(&self, payload: &Value, schema: &RequestSchema) -> CarebaseResult<ValidationReport>;
}

/// Table-oriented access to the record backend.
///
/// Rows are JSON objects keyed by an `"id"` string column. The typed layer
/// on top is `Repository<T>`.
pub trait RecordStore: Send + Sync {
    /// Insert `row` into `table` and return the stored row.
    fn insert(&self, table: &str, row: Value) -> CarebaseResult<Value>;

    /// Insert `row` unless another row already holds the same `unique`
    /// column value. The check and the insert are one atomic step.
    ///
    /// # Errors
    ///
    /// `Conflict` when the value is taken.
    fn insert_unique(&self, table: &str, row: Value, unique: &str) -> CarebaseResult<Value>;

    /// Fetch the row with the given id.
    fn get(&self, table: &str, id: &str) -> CarebaseResult<Option<Value>>;

    /// Return rows matching every filter in `query`, in insertion order,
    /// paginated by `query.offset` / `query.limit`.
    fn list(&self, table: &str, query: &Query) -> CarebaseResult<Vec<Value>>;

    /// Shallow-merge `patch` into the row with the given id. Returns the
    /// merged row, or `None` when no such row exists.
    fn update(&self, table: &str, id: &str, patch: Value) -> CarebaseResult<Option<Value>>;

    /// Like `update`, but fails with `Conflict` if `patch` sets `unique` to
    /// a value some other row already holds. Checked atomically with the
    /// write.
    fn update_unique(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        unique: &str,
    ) -> CarebaseResult<Option<Value>>;

    /// Remove the row with the given id. Returns true if a row was removed.
    fn delete(&self, table: &str, id: &str) -> CarebaseResult<bool>;

    /// Remove every row whose `field` equals `value`. Returns the count.
    fn delete_where(&self, table: &str, field: &str, value: &Value) -> CarebaseResult<usize>;
}

/// Bucketed blob storage with publicly addressable objects.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` as `bucket/name`, creating the bucket if needed, and
    /// return the object's public URL.
    fn put(
        &self,
        bucket: &str,
        name: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> CarebaseResult<String>;
}

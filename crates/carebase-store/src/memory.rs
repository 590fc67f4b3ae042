//! In-memory implementation of `RecordStore`.
//!
//! Tables are `Vec`s of JSON objects so listings come back in insertion
//! order, matching what the hosted backend returns for unordered selects.
//! All state sits behind one `Mutex`; the store is shared across request
//! handlers through an `Arc`.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::debug;

use carebase_contracts::{
    error::{CarebaseError, CarebaseResult},
    store::{Filter, Query},
};
use carebase_core::traits::RecordStore;

#[derive(Default)]
struct InMemoryState {
    tables: HashMap<String, Vec<Value>>,
}

/// A `RecordStore` that keeps every table in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in `table`.
    pub fn count(&self, table: &str) -> CarebaseResult<usize> {
        Ok(self.lock()?.tables.get(table).map_or(0, Vec::len))
    }

    fn insert_row(&self, table: &str, row: Value, unique: Option<&str>) -> CarebaseResult<Value> {
        let id = row_id(&row)
            .ok_or_else(|| CarebaseError::store(format!("{table} row has no string id")))?
            .to_string();

        let mut state = self.lock()?;
        let rows = state.tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| row_id(r) == Some(id.as_str())) {
            return Err(CarebaseError::store(format!("duplicate id {id} in {table}")));
        }
        if let Some(field) = unique {
            ensure_free(rows.as_slice(), table, field, row.get(field), None)?;
        }
        rows.push(row.clone());
        debug!(table = %table, id = %id, "row inserted");
        Ok(row)
    }

    fn merge_row(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        unique: Option<&str>,
    ) -> CarebaseResult<Option<Value>> {
        let Value::Object(fields) = patch else {
            return Err(CarebaseError::store(format!("{table} patch must be a JSON object")));
        };

        let mut state = self.lock()?;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(None);
        };
        if !rows.iter().any(|r| row_id(r) == Some(id)) {
            return Ok(None);
        }
        if let Some(field) = unique {
            ensure_free(rows.as_slice(), table, field, fields.get(field), Some(id))?;
        }
        let Some(row) = rows.iter_mut().find(|r| row_id(r) == Some(id)) else {
            return Ok(None);
        };

        if let Value::Object(columns) = &mut *row {
            for (key, value) in fields {
                if key != "id" {
                    columns.insert(key, value);
                }
            }
        }
        debug!(table = %table, id = %id, "row updated");
        Ok(Some(row.clone()))
    }

    fn lock(&self) -> CarebaseResult<MutexGuard<'_, InMemoryState>> {
        self.state
            .lock()
            .map_err(|e| CarebaseError::store(format!("record store lock poisoned: {}", e)))
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// `Conflict` if a row other than `except` already has `field == value`.
/// Null or absent values never collide.
fn ensure_free(
    rows: &[Value],
    table: &str,
    field: &str,
    value: Option<&Value>,
    except: Option<&str>,
) -> CarebaseResult<()> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(());
    };
    let taken = rows
        .iter()
        .any(|r| r.get(field) == Some(value) && (except.is_none() || row_id(r) != except));
    if taken {
        return Err(CarebaseError::Conflict {
            reason: format!("{table}.{field} {value} is already in use"),
        });
    }
    Ok(())
}

/// Order two column values: RFC 3339 timestamps as instants, numbers
/// numerically, other strings lexically. Mixed kinds do not compare.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => {
            match (
                DateTime::<FixedOffset>::parse_from_rfc3339(a),
                DateTime::<FixedOffset>::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        _ => None,
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let column = |field: &str| row.get(field).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq { field, value } => column(field) == value,
        Filter::Gte { field, value } => {
            matches!(compare(column(field), value), Some(Ordering::Greater | Ordering::Equal))
        }
        Filter::Lte { field, value } => {
            matches!(compare(column(field), value), Some(Ordering::Less | Ordering::Equal))
        }
        Filter::ContainsAny { fields, needle } => {
            let needle = needle.to_lowercase();
            fields.iter().any(|f| {
                column(f)
                    .as_str()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
        }
    }
}

impl RecordStore for InMemoryStore {
    fn insert(&self, table: &str, row: Value) -> CarebaseResult<Value> {
        self.insert_row(table, row, None)
    }

    fn insert_unique(&self, table: &str, row: Value, unique: &str) -> CarebaseResult<Value> {
        self.insert_row(table, row, Some(unique))
    }

    fn get(&self, table: &str, id: &str) -> CarebaseResult<Option<Value>> {
        let state = self.lock()?;
        Ok(state
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| row_id(r) == Some(id)))
            .cloned())
    }

    fn list(&self, table: &str, query: &Query) -> CarebaseResult<Vec<Value>> {
        let state = self.lock()?;
        let Some(rows) = state.tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn update(&self, table: &str, id: &str, patch: Value) -> CarebaseResult<Option<Value>> {
        self.merge_row(table, id, patch, None)
    }

    fn update_unique(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        unique: &str,
    ) -> CarebaseResult<Option<Value>> {
        self.merge_row(table, id, patch, Some(unique))
    }

    fn delete(&self, table: &str, id: &str) -> CarebaseResult<bool> {
        let mut state = self.lock()?;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        Ok(rows.len() != before)
    }

    fn delete_where(&self, table: &str, field: &str, value: &Value) -> CarebaseResult<usize> {
        let mut state = self.lock()?;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| r.get(field) != Some(value));
        let removed = before - rows.len();
        debug!(table = %table, field = %field, removed, "rows deleted");
        Ok(removed)
    }
}

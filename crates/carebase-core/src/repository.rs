//! Typed CRUD over a `RecordStore` table.

use std::{marker::PhantomData, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use carebase_contracts::{
    error::{CarebaseError, CarebaseResult},
    store::{Query, Record},
};

use crate::traits::RecordStore;

/// A handle on the table that stores `T`.
pub struct Repository<T: Record> {
    store: Arc<dyn RecordStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn get(&self, id: &str) -> CarebaseResult<Option<T>> {
        self.store.get(T::TABLE, id)?.map(from_row).transpose()
    }

    pub fn get_multi(&self, query: &Query) -> CarebaseResult<Vec<T>> {
        self.store
            .list(T::TABLE, query)?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// First row whose `field` equals `value`.
    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> CarebaseResult<Option<T>> {
        let query = Query::page(0, 1).eq(field, value);
        Ok(self.get_multi(&query)?.into_iter().next())
    }

    pub fn create(&self, record: &T) -> CarebaseResult<T> {
        let row = to_row(record)?;
        from_row(self.store.insert(T::TABLE, row)?)
    }

    /// Create `record` unless another row already has the same `unique`
    /// column value (`Conflict`).
    pub fn create_unique(&self, record: &T, unique: &str) -> CarebaseResult<T> {
        let row = to_row(record)?;
        from_row(self.store.insert_unique(T::TABLE, row, unique)?)
    }

    /// Apply the set fields of `patch` to the row with the given id.
    ///
    /// Absent fields are left untouched. Timestamped tables get a fresh
    /// `updated_at`.
    pub fn update<P: Serialize>(&self, id: &str, patch: &P) -> CarebaseResult<Option<T>> {
        let patch = patch_row::<T, P>(patch)?;
        self.store.update(T::TABLE, id, patch)?.map(from_row).transpose()
    }

    /// `update`, refusing with `Conflict` when the patch would give `unique`
    /// a value another row holds.
    pub fn update_unique<P: Serialize>(
        &self,
        id: &str,
        patch: &P,
        unique: &str,
    ) -> CarebaseResult<Option<T>> {
        let patch = patch_row::<T, P>(patch)?;
        self.store
            .update_unique(T::TABLE, id, patch, unique)?
            .map(from_row)
            .transpose()
    }

    pub fn delete(&self, id: &str) -> CarebaseResult<bool> {
        self.store.delete(T::TABLE, id)
    }

    pub fn delete_where(&self, field: &str, value: impl Into<Value>) -> CarebaseResult<usize> {
        self.store.delete_where(T::TABLE, field, &value.into())
    }
}

fn to_row<S: Serialize>(value: &S) -> CarebaseResult<Value> {
    serde_json::to_value(value).map_err(|e| CarebaseError::store(format!("encode row: {e}")))
}

fn patch_row<T: Record, P: Serialize>(patch: &P) -> CarebaseResult<Value> {
    let mut patch = to_row(patch)?;
    if let Value::Object(fields) = &mut patch {
        fields.remove("id");
        if T::TIMESTAMPED {
            fields.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        }
    }
    Ok(patch)
}

fn from_row<T: Record>(row: Value) -> CarebaseResult<T> {
    serde_json::from_value(row)
        .map_err(|e| CarebaseError::store(format!("decode {} row: {e}", T::TABLE)))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    /// Minimal table store: equality filters only, no ordering guarantees
    /// beyond insertion into a Vec.
    #[derive(Default)]
    struct VecStore {
        tables: Mutex<HashMap<String, Vec<Value>>>,
    }

    impl RecordStore for VecStore {
        fn insert(&self, table: &str, row: Value) -> CarebaseResult<Value> {
            self.tables.lock().unwrap().entry(table.to_string()).or_default().push(row.clone());
            Ok(row)
        }

        fn insert_unique(&self, table: &str, row: Value, unique: &str) -> CarebaseResult<Value> {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            if rows.iter().any(|r| r[unique] == row[unique]) {
                return Err(CarebaseError::Conflict { reason: format!("{unique} taken") });
            }
            rows.push(row.clone());
            Ok(row)
        }

        fn get(&self, table: &str, id: &str) -> CarebaseResult<Option<Value>> {
            Ok(self
                .tables
                .lock()
                .unwrap()
                .get(table)
                .and_then(|rows| rows.iter().find(|r| r["id"] == id).cloned()))
        }

        fn list(&self, table: &str, query: &Query) -> CarebaseResult<Vec<Value>> {
            let tables = self.tables.lock().unwrap();
            let rows = tables.get(table).cloned().unwrap_or_default();
            Ok(rows
                .into_iter()
                .filter(|r| {
                    query.filters.iter().all(|f| match f {
                        carebase_contracts::store::Filter::Eq { field, value } => &r[field] == value,
                        _ => true,
                    })
                })
                .skip(query.offset)
                .take(query.limit)
                .collect())
        }

        fn update(&self, table: &str, id: &str, patch: Value) -> CarebaseResult<Option<Value>> {
            let mut tables = self.tables.lock().unwrap();
            let Some(row) = tables.get_mut(table).and_then(|rows| rows.iter_mut().find(|r| r["id"] == id)) else {
                return Ok(None);
            };
            if let (Value::Object(target), Value::Object(fields)) = (row, patch) {
                target.extend(fields);
                return Ok(Some(Value::Object(target.clone())));
            }
            Ok(None)
        }

        fn update_unique(
            &self,
            table: &str,
            id: &str,
            patch: Value,
            unique: &str,
        ) -> CarebaseResult<Option<Value>> {
            {
                let tables = self.tables.lock().unwrap();
                let rows = tables.get(table).cloned().unwrap_or_default();
                if patch.get(unique).is_some()
                    && rows.iter().any(|r| r["id"] != id && r[unique] == patch[unique])
                {
                    return Err(CarebaseError::Conflict { reason: format!("{unique} taken") });
                }
            }
            self.update(table, id, patch)
        }

        fn delete(&self, table: &str, id: &str) -> CarebaseResult<bool> {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let before = rows.len();
            rows.retain(|r| r["id"] != id);
            Ok(rows.len() != before)
        }

        fn delete_where(&self, table: &str, field: &str, value: &Value) -> CarebaseResult<usize> {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let before = rows.len();
            rows.retain(|r| &r[field] != value);
            Ok(before - rows.len())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        owner: String,
        body: String,
        #[serde(default)]
        updated_at: Option<String>,
    }

    impl Record for Note {
        const TABLE: &'static str = "notes";
        fn id(&self) -> &str {
            &self.id
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        id: String,
        label: String,
    }

    impl Record for Tag {
        const TABLE: &'static str = "tags";
        const TIMESTAMPED: bool = false;
        fn id(&self) -> &str {
            &self.id
        }
    }

    #[derive(Serialize)]
    struct NotePatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
    }

    fn note(id: &str, owner: &str) -> Note {
        Note {
            id: id.to_string(),
            owner: owner.to_string(),
            body: "hello".to_string(),
            updated_at: None,
        }
    }

    fn repo<T: Record>() -> Repository<T> {
        Repository::new(Arc::new(VecStore::default()))
    }

    #[test]
    fn create_then_get() {
        let notes = repo::<Note>();
        notes.create(&note("n1", "a")).unwrap();

        assert_eq!(notes.get("n1").unwrap(), Some(note("n1", "a")));
        assert_eq!(notes.get("missing").unwrap(), None);
    }

    #[test]
    fn update_applies_only_set_fields_and_stamps_time() {
        let notes = repo::<Note>();
        notes.create(&note("n1", "a")).unwrap();

        let updated = notes
            .update("n1", &NotePatch { body: Some("changed".to_string()), owner: None })
            .unwrap()
            .unwrap();

        assert_eq!(updated.body, "changed");
        assert_eq!(updated.owner, "a");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_of_untimestamped_record_leaves_no_stamp() {
        let store: Arc<dyn RecordStore> = Arc::new(VecStore::default());
        let tags = Repository::<Tag>::new(store.clone());
        tags.create(&Tag { id: "t1".to_string(), label: "x".to_string() }).unwrap();

        tags.update("t1", &json!({ "label": "y" })).unwrap();

        let raw = store.get("tags", "t1").unwrap().unwrap();
        assert_eq!(raw["label"], "y");
        assert!(raw.get("updated_at").is_none());
    }

    #[test]
    fn update_unknown_id_returns_none() {
        let notes = repo::<Note>();
        let result = notes.update("nope", &NotePatch { body: None, owner: None }).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn find_by_and_delete_where() {
        let notes = repo::<Note>();
        notes.create(&note("n1", "a")).unwrap();
        notes.create(&note("n2", "b")).unwrap();
        notes.create(&note("n3", "a")).unwrap();

        assert_eq!(notes.find_by("owner", "b").unwrap().map(|n| n.id), Some("n2".to_string()));
        assert_eq!(notes.delete_where("owner", "a").unwrap(), 2);
        assert_eq!(notes.get_multi(&Query::default()).unwrap().len(), 1);
        assert!(notes.delete("n2").unwrap());
        assert!(!notes.delete("n2").unwrap());
    }

    #[test]
    fn create_unique_and_update_unique_report_conflicts() {
        let notes = repo::<Note>();
        notes.create_unique(&note("n1", "a"), "owner").unwrap();
        notes.create_unique(&note("n2", "b"), "owner").unwrap();

        let err = notes.create_unique(&note("n3", "a"), "owner").unwrap_err();
        assert!(matches!(err, CarebaseError::Conflict { .. }));

        let patch = NotePatch { body: None, owner: Some("a".to_string()) };
        let err = notes.update_unique("n2", &patch, "owner").unwrap_err();
        assert!(matches!(err, CarebaseError::Conflict { .. }));

        let own = notes.update_unique("n1", &patch, "owner").unwrap().unwrap();
        assert_eq!(own.owner, "a");
        assert_eq!(notes.get_multi(&Query::default()).unwrap().len(), 2);
    }

    #[test]
    fn undecodable_row_is_a_store_error() {
        let store: Arc<dyn RecordStore> = Arc::new(VecStore::default());
        store.insert("notes", json!({ "id": "bad" })).unwrap();

        let notes = Repository::<Note>::new(store);
        assert!(matches!(notes.get("bad"), Err(CarebaseError::Store { .. })));
    }
}

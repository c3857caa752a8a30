use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use super::{Catalog, RecordStore, Relation, Table, TableSchema};
use crate::core::{MulticastError, Record, Result, Value};

/// In-memory reference implementation of [`RecordStore`].
///
/// Single-threaded: interior mutability goes through `RefCell`, so a
/// store belongs to one request/thread.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RefCell<Catalog>,
    tables: RefCell<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        let catalog = self.catalog.borrow().clone().with_table(schema.clone())?;
        *self.catalog.borrow_mut() = catalog;
        self.tables.borrow_mut().insert(name.clone(), Table::new(schema));
        debug!("Created table '{}'", name);
        Ok(())
    }

    pub fn catalog(&self) -> Catalog {
        self.catalog.borrow().clone()
    }

    /// Stores the record and returns it with its primary key filled in.
    pub fn insert(&self, mut record: Record) -> Result<Record> {
        self.save(&mut record)?;
        Ok(record)
    }

    pub fn all(&self, table: &str) -> Result<Vec<Record>> {
        self.with_table(table, |t| t.scan().collect())
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        self.with_table(table, Table::row_count)
    }

    fn with_table<T>(&self, table: &str, f: impl FnOnce(&Table) -> T) -> Result<T> {
        let tables = self.tables.borrow();
        let table = tables
            .get(table)
            .ok_or_else(|| MulticastError::TableNotFound(table.to_string()))?;
        Ok(f(table))
    }
}

impl RecordStore for MemoryStore {
    fn relation(&self, table: &str, method: &str) -> Option<Relation> {
        let catalog = self.catalog.borrow();
        catalog.get_table(table).ok()?.find_relation(method).cloned()
    }

    fn find_one_by_equality(
        &self,
        table: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Record>> {
        trace!("find_one_by_equality {}.{} = {}", table, field, value);
        self.with_table(table, |t| t.find_first(field, value))
    }

    fn find_by_primary_key(&self, table: &str, key: &Value) -> Result<Option<Record>> {
        trace!("find_by_primary_key {}[{}]", table, key);
        self.with_table(table, |t| t.get(key))
    }

    fn group_and_pluck(
        &self,
        table: &str,
        value_field: &str,
        key_field: &str,
        group: bool,
    ) -> Result<BTreeMap<Value, Value>> {
        self.with_table(table, |t| {
            let mut plucked = BTreeMap::new();
            let mut rows = t
                .scan()
                .map(|record| {
                    let key = record
                        .get(key_field)
                        .and_then(Value::from_json)
                        .unwrap_or(Value::Null);
                    let value = record
                        .get(value_field)
                        .and_then(Value::from_json)
                        .unwrap_or(Value::Null);
                    (key, value)
                })
                .collect::<Vec<_>>();
            rows.sort_by(|a, b| a.0.cmp(&b.0));

            for (key, value) in rows {
                if group && plucked.values().any(|seen| seen == &value) {
                    continue;
                }
                plucked.entry(key).or_insert(value);
            }
            plucked
        })
    }

    fn save(&self, record: &mut Record) -> Result<()> {
        let mut tables = self.tables.borrow_mut();
        let table = tables
            .get_mut(record.table())
            .ok_or_else(|| MulticastError::TableNotFound(record.table().to_string()))?;
        let key = table.upsert(record)?;
        debug!("Saved record {}[{}]", record.table(), key);
        Ok(())
    }

    fn primary_key_of(&self, table: &str) -> Result<String> {
        let catalog = self.catalog.borrow();
        Ok(catalog.get_table(table)?.primary_key_name().to_string())
    }
}

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use super::TableSchema;
use crate::core::{MulticastError, Record, Result, Value};

/// Rows of one table keyed by primary key.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<Value, BTreeMap<String, JsonValue>>,
    next_row_id: i64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 1,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Inserts a new row or replaces the row with the same primary key.
    ///
    /// Records without a primary key get the next auto-increment id, which
    /// is written back into the record.
    pub fn upsert(&mut self, record: &mut Record) -> Result<Value> {
        if record.table() != self.schema.name() {
            return Err(MulticastError::Storage(format!(
                "Record of table '{}' cannot be stored in '{}'",
                record.table(),
                self.schema.name()
            )));
        }

        let pk = self.schema.primary_key_name().to_string();
        let key = match record.get(&pk) {
            Some(json) if !json.is_null() => Value::scalar_from_json(json).ok_or_else(|| {
                MulticastError::Storage(format!("Primary key '{}' must be a scalar", pk))
            })?,
            _ => {
                let id = self.next_row_id;
                record.set(pk.as_str(), id);
                Value::Integer(id)
            }
        };

        if let Value::Integer(id) = key
            && id >= self.next_row_id
        {
            self.next_row_id = id + 1;
        }

        self.rows.insert(key.clone(), record.fields().clone());
        Ok(key)
    }

    pub fn get(&self, key: &Value) -> Option<Record> {
        self.rows.get(key).map(|fields| self.to_record(fields))
    }

    pub fn scan(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.values().map(|fields| self.to_record(fields))
    }

    pub fn find_first(&self, field: &str, value: &Value) -> Option<Record> {
        self.rows
            .values()
            .find(|fields| {
                fields
                    .get(field)
                    .and_then(Value::from_json)
                    .is_some_and(|candidate| &candidate == value)
            })
            .map(|fields| self.to_record(fields))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn to_record(&self, fields: &BTreeMap<String, JsonValue>) -> Record {
        fields.iter().fold(
            Record::new(self.schema.name()).with_primary_key(self.schema.primary_key_name()),
            |record, (name, value)| record.with_field(name.clone(), value.clone()),
        )
    }
}

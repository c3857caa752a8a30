use std::collections::BTreeMap;

use super::catalog::Relation;
use crate::core::{Record, Result, Value};

/// Record store contract - the only operations the multicasting engine
/// needs from the persistence layer.
///
/// Lookups that find nothing answer `Ok(None)`; errors are reserved for
/// broken configuration (unknown table) or store failures.
pub trait RecordStore {
    /// Looks up a relation method declared on records of `table`.
    fn relation(&self, table: &str, method: &str) -> Option<Relation>;

    /// First record (in primary key order) whose `field` equals `value`.
    fn find_one_by_equality(
        &self,
        table: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Record>>;

    fn find_by_primary_key(&self, table: &str, key: &Value) -> Result<Option<Record>>;

    /// Maps `key_field -> value_field` over the table, ordered by key.
    ///
    /// With `group` set, rows repeating an already seen value are skipped
    /// so every value keeps its first key.
    fn group_and_pluck(
        &self,
        table: &str,
        value_field: &str,
        key_field: &str,
        group: bool,
    ) -> Result<BTreeMap<Value, Value>>;

    /// Inserts or updates the record, assigning a primary key when absent.
    fn save(&self, record: &mut Record) -> Result<()>;

    fn primary_key_of(&self, table: &str) -> Result<String>;
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{DEFAULT_PRIMARY_KEY, MulticastError, Record, Result, Value};
use super::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The foreign key lives on the owning record.
    BelongsTo,
    /// The foreign key lives on the related record.
    HasOne,
    /// Pivot relation; never a one-hop relation.
    BelongsToMany,
}

/// A relation method declared on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    pub related_table: String,
    pub foreign_key: String,
}

impl Relation {
    pub fn is_one_hop(&self) -> bool {
        !matches!(self.kind, RelationKind::BelongsToMany)
    }

    /// Loads the related record addressed by `key`.
    ///
    /// For belongs-to the key is the related primary key, for has-one it
    /// is the owner's primary key.
    pub fn find_by_key(&self, store: &dyn RecordStore, key: &Value) -> Result<Option<Record>> {
        match self.kind {
            RelationKind::BelongsTo => store.find_by_primary_key(&self.related_table, key),
            RelationKind::HasOne => {
                store.find_one_by_equality(&self.related_table, &self.foreign_key, key)
            }
            RelationKind::BelongsToMany => Ok(None),
        }
    }

    /// Follows the relation from a loaded record.
    pub fn follow(&self, store: &dyn RecordStore, record: &Record) -> Result<Option<Record>> {
        let key = match self.kind {
            RelationKind::BelongsTo => record.scalar(&self.foreign_key),
            RelationKind::HasOne => record.key(),
            RelationKind::BelongsToMany => None,
        };

        match key {
            Some(key) => self.find_by_key(store, &key),
            None => Ok(None),
        }
    }

    /// The key `find_by_key` takes to load `related`.
    pub fn key_of(&self, related: &Record) -> Option<Value> {
        match self.kind {
            RelationKind::BelongsTo => related.key(),
            RelationKind::HasOne => related.scalar(&self.foreign_key),
            RelationKind::BelongsToMany => None,
        }
    }

    /// Walks the relation backwards: loads the record of `owner_table`
    /// that `follow` takes to `related`.
    pub fn owner_of(
        &self,
        store: &dyn RecordStore,
        owner_table: &str,
        related: &Record,
    ) -> Result<Option<Record>> {
        let Some(key) = self.key_of(related) else {
            return Ok(None);
        };
        match self.kind {
            RelationKind::BelongsTo => {
                store.find_one_by_equality(owner_table, &self.foreign_key, &key)
            }
            RelationKind::HasOne => store.find_by_primary_key(owner_table, &key),
            RelationKind::BelongsToMany => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    primary_key: String,
    relations: Vec<Relation>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            relations: Vec::new(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn belongs_to(self, name: &str, related_table: &str, foreign_key: &str) -> Self {
        self.relation(name, RelationKind::BelongsTo, related_table, foreign_key)
    }

    pub fn has_one(self, name: &str, related_table: &str, foreign_key: &str) -> Self {
        self.relation(name, RelationKind::HasOne, related_table, foreign_key)
    }

    pub fn belongs_to_many(self, name: &str, related_table: &str, pivot_table: &str) -> Self {
        self.relation(name, RelationKind::BelongsToMany, related_table, pivot_table)
    }

    fn relation(
        mut self,
        name: &str,
        kind: RelationKind,
        related_table: &str,
        foreign_key: &str,
    ) -> Self {
        self.relations.push(Relation {
            name: name.to_string(),
            kind,
            related_table: related_table.to_string(),
            foreign_key: foreign_key.to_string(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    pub fn find_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }
}

/// Table schemas and their relations.
///
/// Cheap to clone; mutations return a new catalog and leave the old one
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Arc<HashMap<String, TableSchema>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, schema: TableSchema) -> Result<Self> {
        let name = schema.name().to_string();

        if self.tables.contains_key(&name) {
            return Err(MulticastError::Storage(format!("Table '{}' already exists", name)));
        }

        let mut new_tables = (*self.tables).clone();
        new_tables.insert(name, schema);

        Ok(Self {
            tables: Arc::new(new_tables),
        })
    }

    pub fn get_table(&self, name: &str) -> Result<&TableSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| MulticastError::TableNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}

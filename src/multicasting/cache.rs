use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use log::trace;

use crate::core::{Result, Value};

/// Discriminator key to type memo shared by all records of one kind.
///
/// Clones share the same entries. Entries never expire; callers decide
/// per call whether to consult it.
#[derive(Debug, Clone, Default)]
pub struct KeyCache {
    entries: Arc<RwLock<BTreeMap<Value, Value>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: Value, entity_type: Value) -> Result<()> {
        trace!("key cache put {} => {}", key, entity_type);
        self.entries.write()?.insert(key, entity_type);
        Ok(())
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>> {
        Ok(self.entries.read()?.get(key).cloned())
    }

    pub fn has(&self, key: &Value) -> Result<bool> {
        Ok(self.entries.read()?.contains_key(key))
    }

    /// First key (in key order) cached for the type.
    pub fn type_to_key(&self, entity_type: &Value) -> Result<Option<Value>> {
        Ok(self
            .entries
            .read()?
            .iter()
            .find(|(_, cached)| *cached == entity_type)
            .map(|(key, _)| key.clone()))
    }

    pub fn has_type(&self, entity_type: &Value) -> Result<bool> {
        Ok(self.type_to_key(entity_type)?.is_some())
    }

    pub fn all(&self) -> Result<BTreeMap<Value, Value>> {
        Ok(self.entries.read()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries.read()?.is_empty())
    }

    pub fn clear(&self) -> Result<()> {
        self.entries.write()?.clear();
        Ok(())
    }
}

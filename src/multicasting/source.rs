use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};
use serde_json::Value as JsonValue;

use super::KeyCache;
use crate::core::{MulticastError, Record, Result, Value};
use crate::storage::{RecordStore, Relation, RelationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The type is a field of the record itself.
    Local,
    /// The type lives on a related record addressed by a key field.
    Remote,
}

/// Parsed `<path>` or `<path>|<cache-key-field>` discriminator source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    raw: String,
    segments: Vec<String>,
    cache_key_field: Option<String>,
}

impl SourceSpec {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = || MulticastError::InvalidSource(source.to_string());

        let (path, cache_key_field) = match source.split_once('|') {
            Some((path, key_field)) => {
                let key_field = key_field.trim();
                if key_field.is_empty() {
                    return Err(invalid());
                }
                (path, Some(key_field.to_string()))
            }
            None => (source, None),
        };

        let segments = path
            .split('.')
            .map(|segment| segment.trim().to_string())
            .collect::<Vec<_>>();
        if segments.iter().any(String::is_empty) {
            return Err(invalid());
        }

        Ok(Self {
            raw: source.to_string(),
            segments,
            cache_key_field,
        })
    }

    pub fn kind(&self) -> SourceKind {
        if self.cache_key_field.is_some() {
            SourceKind::Remote
        } else {
            SourceKind::Local
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Relation (or nested field) names before the terminal field.
    pub fn hops(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn terminal(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn is_single_segment(&self) -> bool {
        self.segments.len() == 1
    }

    pub fn cache_key_field(&self) -> Option<&str> {
        self.cache_key_field.as_deref()
    }

    /// Record field holding the discriminator key.
    pub fn source_of_key(&self) -> &str {
        self.cache_key_field.as_deref().unwrap_or(&self.segments[0])
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Resolves types and keys for one record.
pub struct DiscriminatorSource<'a> {
    spec: &'a SourceSpec,
    record: &'a Record,
    store: &'a dyn RecordStore,
}

impl<'a> DiscriminatorSource<'a> {
    pub fn new(
        spec: Option<&'a SourceSpec>,
        record: &'a Record,
        store: &'a dyn RecordStore,
    ) -> Result<Self> {
        let spec = spec.ok_or(MulticastError::UndefinedSourceOfType)?;
        Ok(Self { spec, record, store })
    }

    pub fn spec(&self) -> &SourceSpec {
        self.spec
    }

    /// The discriminator key of the record.
    pub fn key(&self) -> Option<Value> {
        match self.spec.cache_key_field() {
            Some(field) => self.record.scalar(field),
            None => self.local_type(),
        }
    }

    /// Type of the record. Remote sources consult the cache first when
    /// one is given.
    pub fn get_type(&self, cache: Option<&KeyCache>) -> Result<Option<Value>> {
        match self.spec.kind() {
            SourceKind::Local => Ok(self.local_type()),
            SourceKind::Remote => match self.key() {
                Some(key) => self.type_by_key_cached(&key, cache),
                None => Ok(None),
            },
        }
    }

    /// Walks the path as nested fields of the record.
    pub fn local_type(&self) -> Option<Value> {
        let (first, rest) = self.spec.segments().split_first()?;
        let mut current = self.record.get(first)?;
        for segment in rest {
            current = match current {
                JsonValue::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Value::scalar_from_json(current)
    }

    pub fn type_by_key_cached(
        &self,
        key: &Value,
        cache: Option<&KeyCache>,
    ) -> Result<Option<Value>> {
        if let Some(cache) = cache
            && let Some(cached) = cache.get(key)?
        {
            trace!("key cache hit {} => {}", key, cached);
            return Ok(Some(cached));
        }

        let entity_type = self.type_by_key(key)?;
        if let Some(cache) = cache
            && let Some(entity_type) = &entity_type
        {
            cache.put(key.clone(), entity_type.clone())?;
        }
        Ok(entity_type)
    }

    pub fn key_by_type_cached(
        &self,
        entity_type: &Value,
        cache: Option<&KeyCache>,
    ) -> Result<Option<Value>> {
        if let Some(cache) = cache
            && let Some(cached) = cache.type_to_key(entity_type)?
        {
            trace!("key cache reverse hit {} => {}", entity_type, cached);
            return Ok(Some(cached));
        }

        let key = self.key_by_type(entity_type)?;
        if let Some(cache) = cache
            && let Some(key) = &key
        {
            cache.put(key.clone(), entity_type.clone())?;
        }
        Ok(key)
    }

    /// Looks the type up in the store, bypassing any cache.
    pub fn type_by_key(&self, key: &Value) -> Result<Option<Value>> {
        if key.is_null() {
            return Ok(None);
        }
        debug!("Resolving type of key {} through '{}'", key, self.spec);

        if self.spec.is_single_segment() {
            let found = self
                .store
                .find_one_by_equality(self.record.table(), self.spec.terminal(), key)?;
            return Ok(found.and_then(|record| record.scalar(self.spec.terminal())));
        }

        let mut hops = self.spec.hops().iter();
        let Some(first) = hops
            .next()
            .and_then(|hop| self.one_hop_relation(self.record.table(), hop))
        else {
            return Ok(None);
        };
        let mut current = match first.find_by_key(self.store, key)? {
            Some(record) => record,
            None => return Ok(None),
        };

        for hop in hops {
            let Some(relation) = self.one_hop_relation(current.table(), hop) else {
                return Ok(None);
            };
            current = match relation.follow(self.store, &current)? {
                Some(record) => record,
                None => return Ok(None),
            };
        }

        Ok(current.scalar(self.spec.terminal()))
    }

    pub fn key_by_type(&self, entity_type: &Value) -> Result<Option<Value>> {
        if entity_type.is_null() {
            return Ok(None);
        }

        if self.spec.is_single_segment() {
            let found = self
                .store
                .find_one_by_equality(self.record.table(), self.spec.terminal(), entity_type)?;
            return Ok(found.and_then(|record| record.scalar(self.spec.terminal())));
        }

        let Some(chain) = self.relation_chain() else {
            return Ok(None);
        };
        let Some((_, last)) = chain.last() else {
            return Ok(None);
        };
        let found = self
            .store
            .find_one_by_equality(&last.related_table, self.spec.terminal(), entity_type)?;
        match found {
            Some(record) => self.key_of_terminal(&chain, record),
            None => Ok(None),
        }
    }

    /// Every known type keyed by its discriminator key, in key order.
    ///
    /// With `unique` set a type appearing under several keys keeps its
    /// first key only. Rows with an empty key or type are skipped.
    pub fn all_types_with_keys(&self, unique: bool) -> Result<BTreeMap<Value, Value>> {
        let terminal = self.spec.terminal();
        let plucked = if self.spec.is_single_segment() {
            self.store
                .group_and_pluck(self.record.table(), terminal, terminal, unique)?
        } else {
            let Some(chain) = self.relation_chain() else {
                return Ok(BTreeMap::new());
            };
            self.pluck_through_chain(&chain, unique)?
        };

        Ok(plucked
            .into_iter()
            .filter(|(key, entity_type)| !key.is_empty() && !entity_type.is_empty())
            .collect())
    }

    fn pluck_through_chain(
        &self,
        chain: &[(String, Relation)],
        unique: bool,
    ) -> Result<BTreeMap<Value, Value>> {
        let Some((_, last)) = chain.last() else {
            return Ok(BTreeMap::new());
        };
        let terminal = self.spec.terminal();
        let primary_key = self.store.primary_key_of(&last.related_table)?;

        // A single belongs-to hop is keyed by the related primary key.
        if let [(_, relation)] = chain
            && relation.kind == RelationKind::BelongsTo
        {
            return self
                .store
                .group_and_pluck(&last.related_table, terminal, &primary_key, unique);
        }

        let mut plucked = BTreeMap::new();
        let rows = self
            .store
            .group_and_pluck(&last.related_table, terminal, &primary_key, false)?;
        for related_key in rows.keys() {
            let Some(record) = self
                .store
                .find_by_primary_key(&last.related_table, related_key)?
            else {
                continue;
            };
            let Some(entity_type) = record.scalar(terminal) else {
                continue;
            };
            if let Some(key) = self.key_of_terminal(chain, record)? {
                plucked.insert(key, entity_type);
            }
        }

        if unique {
            let mut seen = Vec::new();
            plucked.retain(|_, entity_type| {
                if seen.contains(entity_type) {
                    return false;
                }
                seen.push(entity_type.clone());
                true
            });
        }
        Ok(plucked)
    }

    /// Walks back from a record of the last table to the key the first
    /// hop is looked up by.
    fn key_of_terminal(
        &self,
        chain: &[(String, Relation)],
        record: Record,
    ) -> Result<Option<Value>> {
        let Some(((_, first), rest)) = chain.split_first() else {
            return Ok(None);
        };

        let mut current = record;
        for (owner_table, relation) in rest.iter().rev() {
            current = match relation.owner_of(self.store, owner_table, &current)? {
                Some(owner) => owner,
                None => return Ok(None),
            };
        }
        Ok(first.key_of(&current))
    }

    /// Every hop as the table it starts from and the relation taken.
    fn relation_chain(&self) -> Option<Vec<(String, Relation)>> {
        let mut table = self.record.table().to_string();
        let mut chain = Vec::with_capacity(self.spec.hops().len());
        for hop in self.spec.hops() {
            let relation = self.one_hop_relation(&table, hop)?;
            let next = relation.related_table.clone();
            chain.push((table, relation));
            table = next;
        }
        Some(chain)
    }

    fn one_hop_relation(&self, table: &str, method: &str) -> Option<Relation> {
        match self.store.relation(table, method) {
            Some(relation) if relation.is_one_hop() => Some(relation),
            Some(_) => {
                debug!("Relation '{}' of '{}' is not a one-hop relation", method, table);
                None
            }
            None => {
                debug!("'{}' is not a relation of '{}'", method, table);
                None
            }
        }
    }
}

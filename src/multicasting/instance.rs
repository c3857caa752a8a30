use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, trace};
use serde_json::Value as JsonValue;

use super::contracts::MulticastingEntity;
use super::source::{DiscriminatorSource, SourceKind};
use super::{HandlerClass, HandlerFactory, KeyCache, MulticastDefinition};
use crate::core::{MulticastError, Record, RecordRef, Result, Value};
use crate::storage::RecordStore;

enum InstanceState {
    Uninitialized,
    /// `None` when the type has no handler; kept until reset.
    Resolved(Option<Box<dyn MulticastingEntity>>),
}

/// A record whose entity attribute is cast to a handler instance.
///
/// The handler is resolved on first access and memoized. Changes made
/// through the handler reach the raw attribute on
/// [`MulticastModel::sync_instance_with_property`] (called by
/// [`MulticastModel::set_instance`]).
pub struct MulticastModel {
    record: RecordRef,
    definition: Arc<MulticastDefinition>,
    store: Rc<dyn RecordStore>,
    state: InstanceState,
}

impl MulticastModel {
    pub fn new(
        record: RecordRef,
        definition: Arc<MulticastDefinition>,
        store: Rc<dyn RecordStore>,
    ) -> Self {
        Self {
            record,
            definition,
            store,
            state: InstanceState::Uninitialized,
        }
    }

    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    pub fn definition(&self) -> &MulticastDefinition {
        &self.definition
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub(crate) fn store_handle(&self) -> Rc<dyn RecordStore> {
        Rc::clone(&self.store)
    }

    pub fn property_for_entity(&self) -> Result<&str> {
        self.definition
            .property_for_entity()
            .ok_or(MulticastError::UndefinedPropertyForEntities)
    }

    /// Raw value of the entity attribute.
    pub fn raw_value(&self) -> Result<JsonValue> {
        let property = self.property_for_entity()?;
        Ok(self
            .record
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or(JsonValue::Null))
    }

    fn set_raw_value(&self, value: JsonValue) -> Result<()> {
        let property = self.property_for_entity()?;
        self.record.borrow_mut().set(property, value);
        Ok(())
    }

    // Types and keys

    pub fn types_of_entities(&self) -> Result<Vec<Value>> {
        self.definition.registry().supported_types()
    }

    fn cache(&self, use_cache: bool) -> Option<&KeyCache> {
        use_cache.then(|| self.definition.key_cache())
    }

    fn with_source<T>(&self, f: impl FnOnce(&DiscriminatorSource<'_>) -> Result<T>) -> Result<T> {
        let record = self.record.borrow();
        let source =
            DiscriminatorSource::new(self.definition.source(), &record, self.store.as_ref())?;
        f(&source)
    }

    pub fn entity_type_by_key(&self, key: &Value, use_cache: bool) -> Result<Option<Value>> {
        self.with_source(|source| source.type_by_key_cached(key, self.cache(use_cache)))
    }

    /// Current type of the record.
    pub fn entity_type(&self, use_cache: bool) -> Result<Option<Value>> {
        self.with_source(|source| source.get_type(self.cache(use_cache)))
    }

    pub fn entity_key_by_type(
        &self,
        entity_type: &Value,
        use_cache: bool,
    ) -> Result<Option<Value>> {
        self.with_source(|source| source.key_by_type_cached(entity_type, self.cache(use_cache)))
    }

    pub fn entity_types(&self, only_supported: bool) -> Result<Vec<Value>> {
        if only_supported {
            return self.types_of_entities();
        }
        Ok(self.entity_types_with_keys(false)?.into_values().collect())
    }

    /// Known types keyed by their discriminator keys.
    pub fn entity_types_with_keys(&self, only_supported: bool) -> Result<BTreeMap<Value, Value>> {
        let types = self.with_source(|source| source.all_types_with_keys(false))?;
        if !only_supported {
            return Ok(types);
        }

        let supported = self.types_of_entities()?;
        Ok(types
            .into_iter()
            .filter(|(_, entity_type)| supported.contains(entity_type))
            .collect())
    }

    pub fn entity_keys(&self, only_supported: bool) -> Result<Vec<Value>> {
        Ok(self.entity_keys_with_types(only_supported)?.into_values().collect())
    }

    /// Discriminator keys keyed by type. A type found under several keys
    /// keeps the last one.
    pub fn entity_keys_with_types(&self, only_supported: bool) -> Result<BTreeMap<Value, Value>> {
        Ok(self
            .entity_types_with_keys(only_supported)?
            .into_iter()
            .map(|(key, entity_type)| (entity_type, key))
            .collect())
    }

    pub fn has_entity_type(&self, entity_type: &Value) -> bool {
        self.definition.registry().has_type(entity_type)
    }

    pub fn has_default_entity_handler(&self) -> bool {
        self.definition.registry().has_default_handler()
    }

    pub fn default_entity_handler(&self) -> Option<&HandlerClass> {
        self.definition.registry().default_handler()
    }

    pub fn handler_class_by_type(&self, entity_type: Option<&Value>) -> Option<&HandlerClass> {
        self.definition.registry().handler_class_for(entity_type)
    }

    pub fn handler_class_or_default(&self, entity_type: Option<&Value>) -> Option<&HandlerClass> {
        self.definition.registry().handler_class_or_default(entity_type)
    }

    // Instance lifecycle

    fn factory(&self) -> HandlerFactory<'_> {
        HandlerFactory::new(&self.definition, &self.record)
    }

    /// The handler of the record, resolved and built on first access.
    pub fn instance(&mut self) -> Result<Option<&mut dyn MulticastingEntity>> {
        if let InstanceState::Uninitialized = self.state {
            let instance = self.make_instance_of_entity()?;
            trace!("Resolved instance: {:?}", instance);
            self.state = InstanceState::Resolved(instance);
        }
        Ok(self.current_instance_mut())
    }

    /// Typed access to the handler.
    pub fn instance_as<T: MulticastingEntity + 'static>(&mut self) -> Result<Option<&mut T>> {
        Ok(self.instance()?.and_then(|instance| instance.downcast_mut::<T>()))
    }

    /// The memoized handler, without resolving it.
    pub fn current_instance(&self) -> Option<&dyn MulticastingEntity> {
        match &self.state {
            InstanceState::Resolved(Some(instance)) => Some(instance.as_ref()),
            _ => None,
        }
    }

    fn current_instance_mut(&mut self) -> Option<&mut dyn MulticastingEntity> {
        match &mut self.state {
            InstanceState::Resolved(Some(instance)) => Some(instance.as_mut()),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, InstanceState::Resolved(_))
    }

    /// Replaces the handler and writes it to the raw attribute.
    pub fn set_instance(&mut self, instance: Box<dyn MulticastingEntity>) -> Result<()> {
        self.state = InstanceState::Resolved(Some(instance));
        self.sync_instance_with_property()?;
        Ok(())
    }

    /// Replaces the handler with one of the same concrete type.
    ///
    /// Without `throw` a missing or different current handler answers
    /// `false` and nothing changes.
    pub fn update_instance(
        &mut self,
        instance: Box<dyn MulticastingEntity>,
        throw: bool,
    ) -> Result<bool> {
        let current_type = match self.instance()? {
            Some(current) => current.as_any().type_id(),
            None if throw => return Err(MulticastError::UndefinedCurrentInstance),
            None => return Ok(false),
        };

        if instance.as_any().type_id() != current_type {
            if throw {
                return Err(MulticastError::DifferentTypesOfEntities);
            }
            return Ok(false);
        }

        self.set_instance(instance)?;
        Ok(true)
    }

    /// Writes the handler state to the raw attribute and returns it.
    pub fn sync_instance_with_property(&mut self) -> Result<JsonValue> {
        self.property_for_entity()?;

        let synced = match self.instance()? {
            Some(instance) if instance.is_array_entity() => {
                Some(JsonValue::Object(instance.to_array()))
            }
            Some(instance) => instance.as_single_value().map(|single| single.value()),
            None => Some(JsonValue::Null),
        };

        if let Some(raw) = synced {
            debug!("Synchronized instance with '{}'", self.property_for_entity()?);
            self.set_raw_value(raw)?;
        }
        self.raw_value()
    }

    pub fn reset_data_of_property(&mut self) -> Result<()> {
        self.set_raw_value(JsonValue::Null)
    }

    /// Clears the raw attribute and forgets the handler.
    pub fn reset(&mut self) -> Result<()> {
        self.reset_data_of_property()?;
        self.state = InstanceState::Uninitialized;
        Ok(())
    }

    /// Points the record at another type and clears the entity data.
    ///
    /// Answers `false`, changing nothing, when a remote source knows no
    /// key for the type.
    pub fn change_entity_type(&mut self, entity_type: &Value) -> Result<bool> {
        let spec = self
            .definition
            .source()
            .ok_or(MulticastError::UndefinedSourceOfType)?;

        match spec.kind() {
            SourceKind::Local => {
                let segments = spec.segments().to_vec();
                set_nested(&mut self.record.borrow_mut(), &segments, entity_type.to_json());
            }
            SourceKind::Remote => {
                let Some(key) = self.entity_key_by_type(entity_type, true)? else {
                    debug!("No key for type {}, type unchanged", entity_type);
                    return Ok(false);
                };
                let field = spec.source_of_key().to_string();
                self.record.borrow_mut().set(field, key.to_json());
            }
        }

        debug!("Changed entity type to {}", entity_type);
        self.reset()?;
        Ok(true)
    }

    pub fn replace_type_and_instance(
        &mut self,
        entity_type: &Value,
        instance: Box<dyn MulticastingEntity>,
    ) -> Result<bool> {
        if !self.change_entity_type(entity_type)? {
            return Ok(false);
        }
        self.set_instance(instance)?;
        Ok(true)
    }

    /// Changes the type and builds the new handler from `raw`.
    pub fn replace_type_and_fill_instance(
        &mut self,
        entity_type: &Value,
        raw: JsonValue,
    ) -> Result<bool> {
        if !self.change_entity_type(entity_type)? {
            return Ok(false);
        }
        self.set_raw_value(raw)?;

        let factory = self.factory();
        let Some(mut instance) = factory.new_instance_by_entity_type(Some(entity_type))? else {
            self.state = InstanceState::Resolved(None);
            return Ok(true);
        };
        if self.definition.config().configure_instance {
            factory.configure(instance.as_mut(), Some(entity_type))?;
        }
        factory.fill(instance.as_mut())?;

        self.set_instance(instance)?;
        Ok(true)
    }

    /// Builds a fresh handler for the current type without memoizing it.
    pub fn make_instance_of_entity(&self) -> Result<Option<Box<dyn MulticastingEntity>>> {
        let entity_type = self.entity_type(true)?;
        debug!("Making instance for type {:?}", entity_type);
        self.factory().make(entity_type.as_ref())
    }

    pub fn make_instance_by_entity_type(
        &self,
        entity_type: &Value,
    ) -> Result<Option<Box<dyn MulticastingEntity>>> {
        self.factory().make(Some(entity_type))
    }

    /// Installs a handler for `entity_type` without syncing it. With
    /// `prepare` it is configured and filled as well.
    pub fn initialize_instance_by_entity_type(
        &mut self,
        entity_type: &Value,
        prepare: bool,
    ) -> Result<Option<&mut dyn MulticastingEntity>> {
        let instance = if prepare {
            self.make_instance_by_entity_type(entity_type)?
        } else {
            self.factory().new_instance_by_entity_type(Some(entity_type))?
        };
        self.state = InstanceState::Resolved(instance);
        Ok(self.current_instance_mut())
    }

    /// Persists the record.
    pub fn save(&self) -> Result<()> {
        let mut record = self.record.borrow_mut();
        self.store.save(&mut record)
    }
}

impl fmt::Debug for MulticastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MulticastModel")
            .field("record", &self.record)
            .field("instance", &self.current_instance())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

fn set_nested(record: &mut Record, segments: &[String], value: JsonValue) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        record.set(first.as_str(), value);
        return;
    }

    let mut root = record.get(first).cloned().unwrap_or(JsonValue::Null);
    let mut current = &mut root;
    for segment in rest {
        if !current.is_object() {
            *current = JsonValue::Object(Default::default());
        }
        current = match current {
            JsonValue::Object(map) => map.entry(segment.clone()).or_insert(JsonValue::Null),
            _ => return,
        };
    }
    *current = value;
    record.set(first.as_str(), root);
}

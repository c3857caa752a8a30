use log::debug;
use serde_json::Value as JsonValue;

use super::contracts::MulticastingEntity;
use super::{ConstructArgs, HandlerClass, MulticastDefinition};
use crate::core::{Capability, EntityArray, MulticastError, RecordRef, Result, Value};

/// Builds handler instances for one record.
pub struct HandlerFactory<'a> {
    definition: &'a MulticastDefinition,
    record: &'a RecordRef,
}

impl<'a> HandlerFactory<'a> {
    pub fn new(definition: &'a MulticastDefinition, record: &'a RecordRef) -> Self {
        Self { definition, record }
    }

    pub fn class_for(&self, entity_type: Option<&Value>) -> Option<&'a HandlerClass> {
        self.definition.registry().handler_class_or_default(entity_type)
    }

    /// Constructs a bare instance of the class.
    pub fn new_instance(&self, class: &HandlerClass) -> Result<Box<dyn MulticastingEntity>> {
        let convention = class.convention();
        let attribute = self.definition.property_for_entity();
        if convention.requires_attribute_name() && attribute.is_none() {
            return Err(MulticastError::UndefinedPropertyForEntities);
        }

        let raw = attribute.and_then(|name| self.record.borrow().get(name).cloned());
        debug!("Constructing '{}' as {}", class.short_name(), convention.as_str());

        Ok(class.construct(&ConstructArgs {
            model: self.record,
            attribute,
            raw: raw.as_ref(),
        }))
    }

    pub fn new_instance_by_entity_type(
        &self,
        entity_type: Option<&Value>,
    ) -> Result<Option<Box<dyn MulticastingEntity>>> {
        self.class_for(entity_type)
            .map(|class| self.new_instance(class))
            .transpose()
    }

    /// Passes the type and the attribute name to handlers keeping them.
    pub fn configure(
        &self,
        instance: &mut dyn MulticastingEntity,
        entity_type: Option<&Value>,
    ) -> Result<()> {
        if let Some(keeper) = instance.as_keeps_entity_type_mut() {
            keeper.set_entity_type(entity_type.cloned().unwrap_or(Value::Null));
        }

        if let Some(keeper) = instance.as_keeps_attribute_name_mut() {
            let attribute = self
                .definition
                .property_for_entity()
                .ok_or(MulticastError::UndefinedPropertyForEntities)?;
            keeper.set_attribute_name(attribute);
        }

        Ok(())
    }

    /// Loads the raw attribute into the instance.
    pub fn fill(&self, instance: &mut dyn MulticastingEntity) -> Result<()> {
        let attribute = self
            .definition
            .property_for_entity()
            .ok_or(MulticastError::UndefinedPropertyForEntities)?;
        let raw = self
            .record
            .borrow()
            .get(attribute)
            .cloned()
            .unwrap_or(JsonValue::Null);

        if let Some(single) = instance.as_single_value_mut() {
            single.set_value(&raw);
        }
        if instance.is_array_entity() {
            match raw {
                JsonValue::Object(array) => instance.fill_from_array(&array),
                _ => instance.fill_from_array(&EntityArray::new()),
            }
        }

        Ok(())
    }

    /// Constructs the instance for a type, then configures and fills it
    /// as the record kind's settings ask.
    pub fn make(&self, entity_type: Option<&Value>) -> Result<Option<Box<dyn MulticastingEntity>>> {
        let Some(mut instance) = self.new_instance_by_entity_type(entity_type)? else {
            debug!("No handler for type {:?}", entity_type);
            return Ok(None);
        };

        let config = self.definition.config();
        if config.configure_instance {
            self.configure(instance.as_mut(), entity_type)?;
        }
        if config.fill_instance && !self.definition.convention().is_self_initializing() {
            self.fill(instance.as_mut())?;
        }

        Ok(Some(instance))
    }
}

/// Fills an array-backed instance.
pub fn fill_from_array(instance: &mut dyn MulticastingEntity, array: &EntityArray) -> Result<()> {
    if !instance.is_array_entity() {
        return Err(MulticastError::InvalidTypeOfInstance(Capability::Array));
    }
    instance.fill_from_array(array);
    Ok(())
}

//! Reading and writing entity data through the handler.
//!
//! Values written here pass through the handler first, so the raw
//! attribute always receives the handler's normalized form. Records
//! without a handler fall back to the raw attribute.

use log::debug;
use serde_json::Value as JsonValue;

use super::MulticastModel;
use crate::core::{Capability, EntityArray, MulticastError, Result};

impl MulticastModel {
    /// Array form of the entity.
    pub fn values_from_instance(&mut self) -> Result<EntityArray> {
        if let Some(instance) = self.instance()? {
            return Ok(instance.to_array());
        }

        Ok(match self.raw_value()? {
            JsonValue::Object(values) => values,
            _ => EntityArray::new(),
        })
    }

    pub fn set_values_to_instance(&mut self, values: EntityArray) -> Result<()> {
        let property = self.property_for_entity()?.to_string();
        let values = match self.instance()? {
            Some(instance) => {
                instance.fill_from_array(&values);
                instance.to_array()
            }
            None => values,
        };

        self.record().borrow_mut().set(property, JsonValue::Object(values));
        Ok(())
    }

    /// Single value of the entity.
    pub fn value_from_instance(&mut self) -> Result<JsonValue> {
        if let Some(instance) = self.instance()? {
            let single = instance
                .as_single_value()
                .ok_or(MulticastError::InvalidTypeOfInstance(Capability::SingleValue))?;
            return Ok(single.value());
        }

        self.raw_value()
    }

    pub fn set_value_to_instance(&mut self, value: JsonValue) -> Result<()> {
        let property = self.property_for_entity()?.to_string();
        let value = match self.instance()? {
            Some(instance) => {
                let single = instance
                    .as_single_value_mut()
                    .ok_or(MulticastError::InvalidTypeOfInstance(Capability::SingleValue))?;
                single.set_value(&value);
                single.value()
            }
            None => value,
        };

        self.record().borrow_mut().set(property, value);
        Ok(())
    }

    /// Flushes a related handler to its owner and persists the owner.
    pub fn save_instance(&mut self) -> Result<()> {
        let store = self.store_handle();
        let instance = self.instance()?.ok_or(MulticastError::UndefinedCurrentInstance)?;
        let related = instance
            .as_related_mut()
            .ok_or(MulticastError::InvalidTypeOfInstance(Capability::Related))?;

        related.save(store.as_ref())?;
        debug!("Saved related instance");
        Ok(())
    }
}

//! Handler contracts.
//!
//! Every handler implements [`MulticastingEntity`]. The optional
//! capabilities are separate traits; a handler advertises the ones it
//! implements by overriding the matching accessor on
//! [`MulticastingEntity`], which is how the factory and the controller
//! query them at runtime.

use std::any::Any;
use std::fmt;

use serde_json::Value as JsonValue;

use crate::core::{Capability, EntityArray, RecordRef, Result, Value};
use crate::storage::RecordStore;

/// Base contract of a handler.
pub trait MulticastingEntity: fmt::Debug {
    /// Replaces the handler state from array-shaped data. Missing or
    /// malformed entries fall back to the handler's defaults.
    fn fill_from_array(&mut self, array: &EntityArray);

    fn to_array(&self) -> EntityArray;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// `to_array` is the stored form of the attribute.
    fn is_array_entity(&self) -> bool {
        false
    }

    fn as_single_value(&self) -> Option<&dyn SingleValueEntity> {
        None
    }

    fn as_single_value_mut(&mut self) -> Option<&mut dyn SingleValueEntity> {
        None
    }

    fn as_keeps_entity_type(&self) -> Option<&dyn KeepsEntityType> {
        None
    }

    fn as_keeps_entity_type_mut(&mut self) -> Option<&mut dyn KeepsEntityType> {
        None
    }

    fn as_keeps_attribute_name(&self) -> Option<&dyn KeepsAttributeName> {
        None
    }

    fn as_keeps_attribute_name_mut(&mut self) -> Option<&mut dyn KeepsAttributeName> {
        None
    }

    fn as_with_model(&self) -> Option<&dyn EntityWithModel> {
        None
    }

    fn as_related(&self) -> Option<&dyn RelatedEntity> {
        None
    }

    fn as_related_mut(&mut self) -> Option<&mut dyn RelatedEntity> {
        None
    }

    fn is_independent(&self) -> bool {
        false
    }
}

impl<'a> dyn MulticastingEntity + 'a {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Array => self.is_array_entity(),
            Capability::SingleValue => self.as_single_value().is_some(),
            Capability::KeepsEntityType => self.as_keeps_entity_type().is_some(),
            Capability::KeepsAttributeName => self.as_keeps_attribute_name().is_some(),
            Capability::WithModel => self.as_with_model().is_some(),
            Capability::Related => self.as_related().is_some(),
            Capability::Independent => self.is_independent(),
        }
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        [
            Capability::Array,
            Capability::SingleValue,
            Capability::KeepsEntityType,
            Capability::KeepsAttributeName,
            Capability::WithModel,
            Capability::Related,
            Capability::Independent,
        ]
        .into_iter()
        .filter(|capability| self.has_capability(*capability))
        .collect()
    }
}

/// Handler stored as one scalar (or arbitrary JSON) value.
pub trait SingleValueEntity {
    fn value(&self) -> JsonValue;

    fn set_value(&mut self, value: &JsonValue);
}

pub trait KeepsEntityType {
    fn entity_type(&self) -> &Value;

    fn set_entity_type(&mut self, entity_type: Value);
}

pub trait KeepsAttributeName {
    fn attribute_name(&self) -> &str;

    fn set_attribute_name(&mut self, name: &str);
}

/// Handler reading its state live from the owner record.
pub trait EntityWithModel {
    fn model(&self) -> RecordRef;
}

/// Handler holding its own copy of the state plus a handle on the owner.
///
/// Changes reach the owner only through [`RelatedEntity::sync_values`]
/// and [`RelatedEntity::save`].
pub trait RelatedEntity {
    /// Writes the handler state into the owner record.
    fn sync_values(&self);

    /// Synchronizes and returns the owner handle.
    fn reference(&self) -> RecordRef {
        self.sync_values();
        self.owner().clone()
    }

    fn owner(&self) -> &RecordRef;

    /// Synchronizes and persists the owner record.
    fn save(&mut self, store: &dyn RecordStore) -> Result<()> {
        self.sync_values();
        let owner = self.owner().clone();
        let mut record = owner.borrow_mut();
        store.save(&mut record)
    }
}

// Construction contracts, one per convention.

pub trait FromModel: MulticastingEntity + EntityWithModel + Sized {
    fn from_model(model: RecordRef) -> Self;
}

pub trait FromModelAndName: MulticastingEntity + EntityWithModel + Sized {
    fn from_model_and_name(model: RecordRef, attribute_name: &str) -> Self;
}

pub trait FromReference: MulticastingEntity + RelatedEntity + Sized {
    fn from_reference(model: RecordRef) -> Self;
}

pub trait FromReferenceAndName: MulticastingEntity + RelatedEntity + Sized {
    fn from_reference_and_name(model: RecordRef, attribute_name: &str) -> Self;
}

/// Built straight from the raw attribute, independent of the record.
pub trait SimpleArrayEntity: MulticastingEntity + Sized {
    fn from_array(array: Option<&EntityArray>) -> Self;
}

/// Built empty and filled afterwards.
pub trait IndependentEntity: MulticastingEntity + Default {}

/// Implements the `as_any` pair of [`MulticastingEntity`].
#[macro_export]
macro_rules! impl_entity_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

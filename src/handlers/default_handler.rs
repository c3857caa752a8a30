use crate::core::EntityArray;
use crate::impl_entity_any;
use crate::multicasting::{IndependentEntity, MulticastingEntity, SimpleArrayEntity};

/// Fallback handler; keeps the data as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultHandler {
    values: EntityArray,
}

impl DefaultHandler {
    pub fn values(&self) -> &EntityArray {
        &self.values
    }
}

impl MulticastingEntity for DefaultHandler {
    fn fill_from_array(&mut self, array: &EntityArray) {
        self.values = array.clone();
    }

    fn to_array(&self) -> EntityArray {
        self.values.clone()
    }

    impl_entity_any!();

    fn is_array_entity(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }
}

impl SimpleArrayEntity for DefaultHandler {
    fn from_array(array: Option<&EntityArray>) -> Self {
        Self {
            values: array.cloned().unwrap_or_default(),
        }
    }
}

impl IndependentEntity for DefaultHandler {}

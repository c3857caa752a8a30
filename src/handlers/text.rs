use serde_json::{Value as JsonValue, json};

use super::text_field;
use crate::core::{EntityArray, Value};
use crate::impl_entity_any;
use crate::multicasting::{
    IndependentEntity, KeepsAttributeName, KeepsEntityType, MulticastingEntity, SingleValueEntity,
};

/// Trimmed text stored as a scalar attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainText {
    text: String,
    attribute_name: String,
    entity_type: Value,
}

impl PlainText {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.trim().to_string();
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl MulticastingEntity for PlainText {
    fn fill_from_array(&mut self, array: &EntityArray) {
        let text = text_field(array, "text").unwrap_or_default();
        self.set_text(&text);
    }

    fn to_array(&self) -> EntityArray {
        let mut array = EntityArray::new();
        array.insert("text".to_string(), json!(self.text));
        array
    }

    impl_entity_any!();

    fn as_single_value(&self) -> Option<&dyn SingleValueEntity> {
        Some(self)
    }

    fn as_single_value_mut(&mut self) -> Option<&mut dyn SingleValueEntity> {
        Some(self)
    }

    fn as_keeps_attribute_name(&self) -> Option<&dyn KeepsAttributeName> {
        Some(self)
    }

    fn as_keeps_attribute_name_mut(&mut self) -> Option<&mut dyn KeepsAttributeName> {
        Some(self)
    }

    fn as_keeps_entity_type(&self) -> Option<&dyn KeepsEntityType> {
        Some(self)
    }

    fn as_keeps_entity_type_mut(&mut self) -> Option<&mut dyn KeepsEntityType> {
        Some(self)
    }

    fn is_independent(&self) -> bool {
        true
    }
}

impl SingleValueEntity for PlainText {
    fn value(&self) -> JsonValue {
        JsonValue::String(self.text.clone())
    }

    /// Numbers and booleans are kept as their text; anything else clears.
    fn set_value(&mut self, value: &JsonValue) {
        match value {
            JsonValue::String(text) => self.set_text(text),
            JsonValue::Number(number) => self.set_text(&number.to_string()),
            JsonValue::Bool(flag) => self.set_text(&flag.to_string()),
            _ => self.text.clear(),
        }
    }
}

impl KeepsAttributeName for PlainText {
    fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    fn set_attribute_name(&mut self, name: &str) {
        self.attribute_name = name.to_string();
    }
}

impl KeepsEntityType for PlainText {
    fn entity_type(&self) -> &Value {
        &self.entity_type
    }

    fn set_entity_type(&mut self, entity_type: Value) {
        self.entity_type = entity_type;
    }
}

impl IndependentEntity for PlainText {}

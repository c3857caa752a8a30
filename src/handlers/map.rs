use serde_json::{Value as JsonValue, json};

use super::{list_field, text_field};
use crate::core::EntityArray;
use crate::impl_entity_any;
use crate::multicasting::{IndependentEntity, MulticastingEntity, SimpleArrayEntity};

/// Map widget of a page: address card plus an embedded map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    title: String,
    address: String,
    phone: String,
    phones: Vec<JsonValue>,
    script: String,
    url: String,
    image: String,
}

impl Map {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: &str) {
        self.address = address.to_string();
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn phones(&self) -> &[JsonValue] {
        &self.phones
    }

    /// Embed code of the map.
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image(&self) -> &str {
        &self.image
    }
}

impl MulticastingEntity for Map {
    fn fill_from_array(&mut self, array: &EntityArray) {
        self.title = text_field(array, "title").unwrap_or_default();
        self.address = text_field(array, "address").unwrap_or_default();
        self.phone = text_field(array, "phone").unwrap_or_default();
        self.phones = list_field(array, "phones");
        self.script = text_field(array, "script").unwrap_or_default();
        self.url = text_field(array, "url").unwrap_or_default();
        self.image = text_field(array, "image").unwrap_or_default();
    }

    fn to_array(&self) -> EntityArray {
        let mut array = EntityArray::new();
        array.insert("title".to_string(), json!(self.title));
        array.insert("address".to_string(), json!(self.address));
        array.insert("phone".to_string(), json!(self.phone));
        array.insert("phones".to_string(), JsonValue::Array(self.phones.clone()));
        array.insert("script".to_string(), json!(self.script));
        array.insert("url".to_string(), json!(self.url));
        array.insert("image".to_string(), json!(self.image));
        array
    }

    impl_entity_any!();

    fn is_array_entity(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }
}

impl SimpleArrayEntity for Map {
    fn from_array(array: Option<&EntityArray>) -> Self {
        let mut map = Self::default();
        map.fill_from_array(array.unwrap_or(&EntityArray::new()));
        map
    }
}

impl IndependentEntity for Map {}

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use super::{bool_field, int_field, text_field};
use crate::core::EntityArray;
use crate::impl_entity_any;
use crate::multicasting::{IndependentEntity, MulticastingEntity, SimpleArrayEntity};

/// One picture of an image list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default, rename = "source_type")]
    pub default_source_type: Option<String>,
}

impl Image {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            title: None,
            alt: String::new(),
            default_source_type: None,
        }
    }

    pub fn url(&self) -> &'static str {
        "/link/to/image"
    }

    pub fn download_link(&self) -> &'static str {
        "/link/to/download"
    }
}

/// Image gallery of a page.
///
/// The list is kept as stored; [`Images::images`] parses it on demand and
/// skips entries that are not images.
#[derive(Debug, Clone, PartialEq)]
pub struct Images {
    list: Vec<JsonValue>,
    active: bool,
    number_of_visible_images: i64,
    visualization_type: String,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            active: false,
            number_of_visible_images: 0,
            visualization_type: "list".to_string(),
        }
    }
}

impl Images {
    pub fn list(&self) -> &[JsonValue] {
        &self.list
    }

    pub fn images(&self) -> Vec<Image> {
        self.list
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }

    pub fn set_images(&mut self, images: &[Image]) {
        self.list = images
            .iter()
            .filter_map(|image| serde_json::to_value(image).ok())
            .collect();
    }

    pub fn ids(&self) -> Vec<i64> {
        self.images().iter().map(|image| image.id).collect()
    }

    pub fn urls(&self) -> Vec<&'static str> {
        self.images().iter().map(Image::url).collect()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn number_of_visible_images(&self) -> i64 {
        self.number_of_visible_images
    }

    pub fn visualization_type(&self) -> &str {
        &self.visualization_type
    }
}

impl MulticastingEntity for Images {
    fn fill_from_array(&mut self, array: &EntityArray) {
        self.list = match array.get("list") {
            Some(JsonValue::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        self.active = bool_field(array, "active").unwrap_or(false);
        self.number_of_visible_images = int_field(array, "number_of_visible_images").unwrap_or(0);
        self.visualization_type =
            text_field(array, "visualization_type").unwrap_or_else(|| "list".to_string());
    }

    fn to_array(&self) -> EntityArray {
        let mut array = EntityArray::new();
        array.insert("list".to_string(), JsonValue::Array(self.list.clone()));
        array.insert("active".to_string(), json!(self.active));
        array.insert("number_of_visible_images".to_string(), json!(self.number_of_visible_images));
        array.insert("visualization_type".to_string(), json!(self.visualization_type));
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

impl SimpleArrayEntity for Images {
    fn from_array(array: Option<&EntityArray>) -> Self {
        let mut images = Self::default();
        if let Some(array) = array {
            images.fill_from_array(array);
        }
        images
    }
}

impl IndependentEntity for Images {}

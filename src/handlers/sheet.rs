//! Sheet geometry handlers.
//!
//! A sheet record carries `height` and `width` fields plus an attribute
//! (`properties` unless told otherwise) with the margins.

use serde_json::{Value as JsonValue, json};

use super::int_field;
use crate::core::{EntityArray, RecordRef, Value};
use crate::impl_entity_any;
use crate::multicasting::{
    EntityWithModel, FromModel, FromModelAndName, FromReference, FromReferenceAndName,
    IndependentEntity, KeepsEntityType, MulticastingEntity, RelatedEntity,
};

pub const DEFAULT_SHEET_ATTRIBUTE: &str = "properties";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl Margins {
    /// Missing margins are zero.
    pub fn from_array(array: &EntityArray) -> Self {
        Self {
            top: int_field(array, "margin_top").unwrap_or(0),
            bottom: int_field(array, "margin_bottom").unwrap_or(0),
            left: int_field(array, "margin_left").unwrap_or(0),
            right: int_field(array, "margin_right").unwrap_or(0),
        }
    }

    pub fn to_array(&self) -> EntityArray {
        let mut array = EntityArray::new();
        array.insert("margin_top".to_string(), json!(self.top));
        array.insert("margin_bottom".to_string(), json!(self.bottom));
        array.insert("margin_left".to_string(), json!(self.left));
        array.insert("margin_right".to_string(), json!(self.right));
        array
    }

    fn write_into(&self, array: &mut EntityArray) {
        array.extend(self.to_array());
    }
}

fn fits(available_height: i64, available_width: i64, height: i64, width: i64) -> bool {
    height >= 1 && width >= 1 && available_height >= height && available_width >= width
}

fn geometry_array(width: i64, height: i64, margins: &Margins) -> EntityArray {
    let mut array = EntityArray::new();
    array.insert("width".to_string(), json!(width));
    array.insert("height".to_string(), json!(height));
    array.insert(
        "available_height".to_string(),
        json!(height - margins.top - margins.bottom),
    );
    array.insert(
        "available_width".to_string(),
        json!(width - margins.left - margins.right),
    );
    margins.write_into(&mut array);
    array
}

fn object_field(model: &RecordRef, attribute: &str) -> EntityArray {
    match model.borrow().get(attribute) {
        Some(JsonValue::Object(array)) => array.clone(),
        _ => EntityArray::new(),
    }
}

fn int_of_model(model: &RecordRef, field: &str) -> i64 {
    model
        .borrow()
        .scalar(field)
        .and_then(|value| value.as_i64())
        .unwrap_or(0)
}

/// Roll of paper. Reads everything live from the sheet record.
#[derive(Debug, Clone)]
pub struct RollPaperType {
    model: RecordRef,
    attribute: String,
}

impl RollPaperType {
    fn properties(&self) -> EntityArray {
        object_field(&self.model, &self.attribute)
    }

    pub fn height(&self) -> i64 {
        int_of_model(&self.model, "height")
    }

    pub fn width(&self) -> i64 {
        int_of_model(&self.model, "width")
    }

    pub fn margins(&self) -> Margins {
        Margins::from_array(&self.properties())
    }

    pub fn indent(&self) -> i64 {
        int_field(&self.properties(), "indent").unwrap_or(0)
    }

    pub fn available_height(&self) -> i64 {
        let margins = self.margins();
        self.height() - margins.top - margins.bottom
    }

    pub fn available_width(&self) -> i64 {
        let margins = self.margins();
        self.width() - margins.left - margins.right
    }

    pub fn can_contain(&self, height: i64, width: i64) -> bool {
        fits(self.available_height(), self.available_width(), height, width)
    }
}

impl MulticastingEntity for RollPaperType {
    /// Writes margins and the given dimensions straight into the record.
    fn fill_from_array(&mut self, array: &EntityArray) {
        let mut properties = self.properties();
        Margins::from_array(array).write_into(&mut properties);

        let mut model = self.model.borrow_mut();
        if let Some(width) = int_field(array, "width") {
            model.set("width", width);
        }
        if let Some(height) = int_field(array, "height") {
            model.set("height", height);
        }
        model.set(self.attribute.as_str(), JsonValue::Object(properties));
    }

    fn to_array(&self) -> EntityArray {
        geometry_array(self.width(), self.height(), &self.margins())
    }

    impl_entity_any!();

    fn is_array_entity(&self) -> bool {
        true
    }

    fn as_with_model(&self) -> Option<&dyn EntityWithModel> {
        Some(self)
    }

    fn as_related(&self) -> Option<&dyn RelatedEntity> {
        Some(self)
    }

    fn as_related_mut(&mut self) -> Option<&mut dyn RelatedEntity> {
        Some(self)
    }
}

impl EntityWithModel for RollPaperType {
    fn model(&self) -> RecordRef {
        self.model.clone()
    }
}

impl RelatedEntity for RollPaperType {
    // State already lives on the record.
    fn sync_values(&self) {}

    fn owner(&self) -> &RecordRef {
        &self.model
    }
}

impl FromModel for RollPaperType {
    fn from_model(model: RecordRef) -> Self {
        Self::from_model_and_name(model, DEFAULT_SHEET_ATTRIBUTE)
    }
}

impl FromModelAndName for RollPaperType {
    fn from_model_and_name(model: RecordRef, attribute_name: &str) -> Self {
        Self {
            model,
            attribute: attribute_name.to_string(),
        }
    }
}

impl FromReference for RollPaperType {
    fn from_reference(model: RecordRef) -> Self {
        Self::from_model(model)
    }
}

impl FromReferenceAndName for RollPaperType {
    fn from_reference_and_name(model: RecordRef, attribute_name: &str) -> Self {
        Self::from_model_and_name(model, attribute_name)
    }
}

/// Single sheet holding its own copy of the geometry.
///
/// Changes reach the record on [`RelatedEntity::sync_values`]: the
/// dimensions go to `height`/`width`, the attribute receives the margins
/// only.
#[derive(Debug, Clone)]
pub struct SingleType {
    model: RecordRef,
    attribute: String,
    entity_type: Value,
    height: i64,
    width: i64,
    margins: Margins,
}

impl SingleType {
    fn load(model: RecordRef, attribute: &str) -> Self {
        let mut sheet = Self {
            height: int_of_model(&model, "height"),
            width: int_of_model(&model, "width"),
            margins: Margins::default(),
            entity_type: Value::Null,
            attribute: attribute.to_string(),
            model,
        };
        let properties = object_field(&sheet.model, attribute);
        sheet.fill_from_array(&properties);
        sheet
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn set_height(&mut self, height: i64) {
        self.height = height;
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn set_width(&mut self, width: i64) {
        self.width = width;
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn set_top_margin(&mut self, margin: i64) {
        self.margins.top = margin;
    }

    pub fn set_bottom_margin(&mut self, margin: i64) {
        self.margins.bottom = margin;
    }

    pub fn set_left_margin(&mut self, margin: i64) {
        self.margins.left = margin;
    }

    pub fn set_right_margin(&mut self, margin: i64) {
        self.margins.right = margin;
    }

    pub fn available_height(&self) -> i64 {
        self.height - self.margins.top - self.margins.bottom
    }

    pub fn available_width(&self) -> i64 {
        self.width - self.margins.left - self.margins.right
    }

    pub fn can_contain(&self, height: i64, width: i64) -> bool {
        fits(self.available_height(), self.available_width(), height, width)
    }

    pub fn array_with_margins(&self) -> EntityArray {
        self.margins.to_array()
    }
}

impl MulticastingEntity for SingleType {
    fn fill_from_array(&mut self, array: &EntityArray) {
        self.margins = Margins::from_array(array);
        if let Some(width) = int_field(array, "width") {
            self.width = width;
        }
        if let Some(height) = int_field(array, "height") {
            self.height = height;
        }
    }

    fn to_array(&self) -> EntityArray {
        geometry_array(self.width, self.height, &self.margins)
    }

    impl_entity_any!();

    fn is_array_entity(&self) -> bool {
        true
    }

    fn as_keeps_entity_type(&self) -> Option<&dyn KeepsEntityType> {
        Some(self)
    }

    fn as_keeps_entity_type_mut(&mut self) -> Option<&mut dyn KeepsEntityType> {
        Some(self)
    }

    fn as_with_model(&self) -> Option<&dyn EntityWithModel> {
        Some(self)
    }

    fn as_related(&self) -> Option<&dyn RelatedEntity> {
        Some(self)
    }

    fn as_related_mut(&mut self) -> Option<&mut dyn RelatedEntity> {
        Some(self)
    }
}

impl KeepsEntityType for SingleType {
    fn entity_type(&self) -> &Value {
        &self.entity_type
    }

    fn set_entity_type(&mut self, entity_type: Value) {
        self.entity_type = entity_type;
    }
}

impl EntityWithModel for SingleType {
    /// Synchronizes first, like [`RelatedEntity::reference`].
    fn model(&self) -> RecordRef {
        self.reference()
    }
}

impl RelatedEntity for SingleType {
    fn sync_values(&self) {
        let mut model = self.model.borrow_mut();
        model.set("height", self.height);
        model.set("width", self.width);
        model.set(self.attribute.as_str(), JsonValue::Object(self.array_with_margins()));
    }

    fn owner(&self) -> &RecordRef {
        &self.model
    }
}

impl FromModel for SingleType {
    fn from_model(model: RecordRef) -> Self {
        Self::load(model, DEFAULT_SHEET_ATTRIBUTE)
    }
}

impl FromReference for SingleType {
    fn from_reference(model: RecordRef) -> Self {
        Self::load(model, DEFAULT_SHEET_ATTRIBUTE)
    }
}

impl FromReferenceAndName for SingleType {
    fn from_reference_and_name(model: RecordRef, attribute_name: &str) -> Self {
        Self::load(model, attribute_name)
    }
}

/// Single sheet detached from any record; only the margins are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndependentSingleType {
    height: i64,
    width: i64,
    margins: Margins,
}

impl IndependentSingleType {
    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn set_height(&mut self, height: i64) {
        self.height = height;
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn set_width(&mut self, width: i64) {
        self.width = width;
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn set_margins(&mut self, margins: Margins) {
        self.margins = margins;
    }

    pub fn available_height(&self) -> i64 {
        self.height - self.margins.top - self.margins.bottom
    }

    pub fn available_width(&self) -> i64 {
        self.width - self.margins.left - self.margins.right
    }

    pub fn can_contain(&self, height: i64, width: i64) -> bool {
        fits(self.available_height(), self.available_width(), height, width)
    }
}

impl MulticastingEntity for IndependentSingleType {
    fn fill_from_array(&mut self, array: &EntityArray) {
        self.margins = Margins::from_array(array);
    }

    fn to_array(&self) -> EntityArray {
        self.margins.to_array()
    }

    impl_entity_any!();

    fn is_array_entity(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }
}

impl IndependentEntity for IndependentSingleType {}

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::Value;

/// Array-shaped entity data as stored in a raw attribute.
pub type EntityArray = serde_json::Map<String, JsonValue>;

/// Request-scoped handle on a record shared between a controller and
/// the handlers built from it.
pub type RecordRef = Rc<RefCell<Record>>;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// A row of a table: named fields holding JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    table: String,
    primary_key: String,
    fields: BTreeMap<String, JsonValue>,
}

impl Record {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    pub fn key(&self) -> Option<Value> {
        self.scalar(&self.primary_key)
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    /// Returns the field as a non-null scalar.
    pub fn scalar(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(Value::scalar_from_json)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn fields(&self) -> &BTreeMap<String, JsonValue> {
        &self.fields
    }

    pub fn into_ref(self) -> RecordRef {
        Rc::new(RefCell::new(self))
    }
}

/// Optional contracts a handler may implement on top of the base
/// array contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Array,
    SingleValue,
    KeepsEntityType,
    KeepsAttributeName,
    WithModel,
    Related,
    Independent,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Array => "ArrayEntity",
            Self::SingleValue => "SingleValueEntity",
            Self::KeepsEntityType => "KeepsEntityType",
            Self::KeepsAttributeName => "KeepsAttributeName",
            Self::WithModel => "EntityWithModel",
            Self::Related => "RelatedEntity",
            Self::Independent => "IndependentEntity",
        };
        write!(f, "{}", name)
    }
}

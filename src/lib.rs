// ============================================================================
// Attribute multicasting for records
// ============================================================================

//! Casts one attribute of a record to a typed handler chosen by the
//! record's type.
//!
//! The type is read from the record itself (`"type"`) or from a related
//! record addressed by a key field (`"af.type|additional_field_id"`).
//! Each type maps to a handler class; the handler is built lazily, kept
//! per record and written back to the raw attribute on sync.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use multicasting::handlers::{DefaultHandler, Map};
//! use multicasting::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> multicasting::Result<()> {
//! let store = MemoryStore::new();
//! store.create_table(TableSchema::new("blocks"))?;
//! let record = store.insert(
//!     Record::new("blocks")
//!         .with_field("type", "map")
//!         .with_field("values", json!({"title": "Office"})),
//! )?;
//!
//! let definition = MulticastDefinition::builder(
//!     MulticastConfig::new()
//!         .property_for_entity("values")
//!         .source_with_entity_type("type")
//!         .interface_type(EntityConvention::SimpleArray),
//! )
//! .entity_type("map", HandlerClass::simple_array::<Map>())
//! .default_handler(HandlerClass::simple_array::<DefaultHandler>())
//! .build()?;
//!
//! let mut model = MulticastModel::new(record.into_ref(), definition, Rc::new(store));
//! if let Some(map) = model.instance_as::<Map>()? {
//!     map.set_title("Head office");
//! }
//! model.sync_instance_with_property()?;
//! model.save()?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod handlers;
pub mod multicasting;
pub mod prelude;
pub mod storage;

pub use core::{Capability, EntityArray, MulticastError, Record, RecordRef, Result, Value};
pub use multicasting::{
    EntityConvention, HandlerClass, KeyCache, MulticastConfig, MulticastDefinition, MulticastModel,
    MulticastingEntity, TypeRegistry,
};
pub use storage::{MemoryStore, RecordStore};

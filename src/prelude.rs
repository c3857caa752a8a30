//! Everything needed to declare a record kind and work with its records.
//!
//! Handler authors additionally want the capability traits re-exported
//! here together with the `impl_entity_any!` macro.

pub use crate::core::{Capability, EntityArray, MulticastError, Record, RecordRef, Result, Value};
pub use crate::impl_entity_any;
pub use crate::multicasting::{
    EntityConvention, EntityWithModel, FromModel, FromModelAndName, FromReference,
    FromReferenceAndName, HandlerClass, IndependentEntity, KeepsAttributeName, KeepsEntityType,
    KeyCache, MulticastConfig, MulticastDefinition, MulticastModel, MulticastingEntity,
    RelatedEntity, SimpleArrayEntity, SingleValueEntity, TypeRegistry,
};
pub use crate::storage::{MemoryStore, RecordStore, TableSchema};

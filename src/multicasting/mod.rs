//! The multicasting engine.
//!
//! A [`MulticastDefinition`] describes a record kind: where its type
//! comes from, which handler class serves each type and how handlers are
//! built. A [`MulticastModel`] wraps one record of that kind and owns its
//! handler instance.

pub mod accessors;
pub mod cache;
pub mod config;
pub mod contracts;
pub mod definition;
pub mod factory;
pub mod instance;
pub mod registry;
pub mod source;

pub use cache::KeyCache;
pub use config::{EntityConvention, MulticastConfig};
pub use contracts::{
    EntityWithModel, FromModel, FromModelAndName, FromReference, FromReferenceAndName,
    IndependentEntity, KeepsAttributeName, KeepsEntityType, MulticastingEntity, RelatedEntity,
    SimpleArrayEntity, SingleValueEntity,
};
pub use definition::{MulticastDefinition, MulticastDefinitionBuilder};
pub use factory::{HandlerFactory, fill_from_array};
pub use instance::MulticastModel;
pub use registry::{ConstructArgs, HandlerClass, TypeRegistry};
pub use source::{DiscriminatorSource, SourceKind, SourceSpec};

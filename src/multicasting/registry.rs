use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::EntityConvention;
use super::contracts::{
    FromModel, FromModelAndName, FromReference, FromReferenceAndName, IndependentEntity,
    MulticastingEntity, SimpleArrayEntity,
};
use crate::core::{MulticastError, RecordRef, Result, Value};

/// Inputs available to a handler constructor.
pub struct ConstructArgs<'a> {
    pub model: &'a RecordRef,
    pub attribute: Option<&'a str>,
    pub raw: Option<&'a JsonValue>,
}

type DynamicConstructor =
    Arc<dyn Fn(&ConstructArgs<'_>) -> Box<dyn MulticastingEntity> + Send + Sync>;

/// A constructible handler class tagged with its construction convention.
#[derive(Clone)]
pub struct HandlerClass {
    name: &'static str,
    convention: EntityConvention,
    construct: DynamicConstructor,
}

impl HandlerClass {
    pub fn with_model<T>() -> Self
    where
        T: FromModel + 'static,
    {
        Self::from_parts::<T>(EntityConvention::WithModel, |args| {
            Box::new(T::from_model(args.model.clone()))
        })
    }

    pub fn with_model_and_name<T>() -> Self
    where
        T: FromModelAndName + 'static,
    {
        Self::from_parts::<T>(EntityConvention::WithModelAndName, |args| {
            Box::new(T::from_model_and_name(args.model.clone(), args.attribute.unwrap_or_default()))
        })
    }

    pub fn related<T>() -> Self
    where
        T: FromReference + 'static,
    {
        Self::from_parts::<T>(EntityConvention::Related, |args| {
            Box::new(T::from_reference(args.model.clone()))
        })
    }

    pub fn related_with_name<T>() -> Self
    where
        T: FromReferenceAndName + 'static,
    {
        Self::from_parts::<T>(EntityConvention::RelatedWithName, |args| {
            Box::new(T::from_reference_and_name(
                args.model.clone(),
                args.attribute.unwrap_or_default(),
            ))
        })
    }

    pub fn simple_array<T>() -> Self
    where
        T: SimpleArrayEntity + 'static,
    {
        Self::from_parts::<T>(EntityConvention::SimpleArray, |args| {
            Box::new(T::from_array(args.raw.and_then(JsonValue::as_object)))
        })
    }

    pub fn independent<T>() -> Self
    where
        T: IndependentEntity + 'static,
    {
        Self::from_parts::<T>(EntityConvention::Independent, |_| Box::new(T::default()))
    }

    fn from_parts<T: 'static>(
        convention: EntityConvention,
        construct: impl Fn(&ConstructArgs<'_>) -> Box<dyn MulticastingEntity>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: std::any::type_name::<T>(),
            convention,
            construct: Arc::new(construct),
        }
    }

    /// Fully qualified type name of the handler.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without the module path.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    pub fn convention(&self) -> EntityConvention {
        self.convention
    }

    pub fn construct(&self, args: &ConstructArgs<'_>) -> Box<dyn MulticastingEntity> {
        (self.construct)(args)
    }
}

impl fmt::Debug for HandlerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerClass")
            .field("name", &self.name)
            .field("convention", &self.convention)
            .finish()
    }
}

impl PartialEq for HandlerClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.convention == other.convention
    }
}

/// Type to handler class mapping of a record kind.
///
/// A registry without any `with_type` call has no mapping at all, which
/// is different from an empty one: `supported_types` fails on it.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    mapping: Option<Vec<(Value, HandlerClass)>>,
    default_handler: Option<HandlerClass>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a mapping, possibly with no entries yet.
    pub fn with_mapping(mut self) -> Self {
        self.mapping.get_or_insert_with(Vec::new);
        self
    }

    /// Maps a type to a handler class; a repeated type replaces the
    /// previous class in place.
    pub fn with_type(mut self, entity_type: impl Into<Value>, class: HandlerClass) -> Self {
        let entity_type = entity_type.into();
        let mapping = self.mapping.get_or_insert_with(Vec::new);
        match mapping.iter_mut().find(|(mapped, _)| mapped == &entity_type) {
            Some(entry) => entry.1 = class,
            None => mapping.push((entity_type, class)),
        }
        self
    }

    pub fn with_default_handler(mut self, class: HandlerClass) -> Self {
        self.default_handler = Some(class);
        self
    }

    /// Mapped types in registration order.
    pub fn supported_types(&self) -> Result<Vec<Value>> {
        self.mapping
            .as_ref()
            .map(|mapping| mapping.iter().map(|(entity_type, _)| entity_type.clone()).collect())
            .ok_or(MulticastError::UndefinedEntityTypeMapping)
    }

    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn has_type(&self, entity_type: &Value) -> bool {
        self.handler_class_for(Some(entity_type)).is_some()
    }

    pub fn handler_class_for(&self, entity_type: Option<&Value>) -> Option<&HandlerClass> {
        let entity_type = entity_type?;
        self.mapping
            .as_ref()?
            .iter()
            .find(|(mapped, _)| mapped == entity_type)
            .map(|(_, class)| class)
    }

    pub fn handler_class_or_default(&self, entity_type: Option<&Value>) -> Option<&HandlerClass> {
        self.handler_class_for(entity_type)
            .or(self.default_handler.as_ref())
    }

    pub fn has_default_handler(&self) -> bool {
        self.default_handler.is_some()
    }

    pub fn default_handler(&self) -> Option<&HandlerClass> {
        self.default_handler.as_ref()
    }

    pub fn classes(&self) -> impl Iterator<Item = &HandlerClass> {
        self.mapping
            .iter()
            .flatten()
            .map(|(_, class)| class)
            .chain(self.default_handler.iter())
    }

    /// Checks every class against the record kind's convention.
    pub fn validate(&self, convention: EntityConvention) -> Result<()> {
        for (entity_type, class) in self.mapping.iter().flatten() {
            if entity_type.is_null() {
                return Err(MulticastError::InvalidConfig(format!(
                    "Handler '{}' is mapped to a null type",
                    class.short_name()
                )));
            }
            Self::check_convention(&entity_type.to_string(), class, convention)?;
        }

        if let Some(class) = &self.default_handler {
            Self::check_convention("<default>", class, convention)?;
        }

        Ok(())
    }

    fn check_convention(
        entity_type: &str,
        class: &HandlerClass,
        convention: EntityConvention,
    ) -> Result<()> {
        if class.convention() == convention {
            return Ok(());
        }

        Err(MulticastError::IncompatibleHandler {
            entity_type: entity_type.to_string(),
            class: class.short_name().to_string(),
            expected: convention.as_str().to_string(),
            actual: class.convention().as_str().to_string(),
        })
    }
}

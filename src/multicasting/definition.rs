use std::sync::Arc;

use log::{debug, warn};

use super::{EntityConvention, HandlerClass, KeyCache, MulticastConfig, SourceSpec, TypeRegistry};
use crate::core::{Result, Value};

/// Everything the engine knows about one record kind.
///
/// Built once at startup and shared by every controller of the kind.
#[derive(Debug)]
pub struct MulticastDefinition {
    config: MulticastConfig,
    source: Option<SourceSpec>,
    registry: TypeRegistry,
    key_cache: KeyCache,
}

impl MulticastDefinition {
    pub fn builder(config: MulticastConfig) -> MulticastDefinitionBuilder {
        MulticastDefinitionBuilder {
            config,
            registry: TypeRegistry::new(),
            key_cache: None,
        }
    }

    pub fn config(&self) -> &MulticastConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&SourceSpec> {
        self.source.as_ref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn key_cache(&self) -> &KeyCache {
        &self.key_cache
    }

    pub fn convention(&self) -> EntityConvention {
        self.config.interface_type
    }

    pub fn property_for_entity(&self) -> Option<&str> {
        self.config.property_for_entity.as_deref()
    }
}

pub struct MulticastDefinitionBuilder {
    config: MulticastConfig,
    registry: TypeRegistry,
    key_cache: Option<KeyCache>,
}

impl MulticastDefinitionBuilder {
    pub fn entity_type(mut self, entity_type: impl Into<Value>, class: HandlerClass) -> Self {
        self.registry = self.registry.with_type(entity_type, class);
        self
    }

    pub fn default_handler(mut self, class: HandlerClass) -> Self {
        self.registry = self.registry.with_default_handler(class);
        self
    }

    /// Replaces the registry assembled so far.
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Shares an existing cache instead of a fresh one.
    pub fn key_cache(mut self, cache: KeyCache) -> Self {
        self.key_cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Arc<MulticastDefinition>> {
        self.config.validate()?;
        let source = self
            .config
            .source_with_entity_type
            .as_deref()
            .map(SourceSpec::parse)
            .transpose()?;
        self.registry.validate(self.config.interface_type)?;

        if let Some(default) = self.registry.default_handler()
            && self.registry.classes().filter(|class| *class == default).count() > 1
        {
            warn!(
                "Default handler '{}' is also mapped to a type",
                default.short_name()
            );
        }

        debug!(
            "Built multicast definition: property {:?}, source {:?}, {} handler class(es)",
            self.config.property_for_entity,
            self.config.source_with_entity_type,
            self.registry.classes().count()
        );

        Ok(Arc::new(MulticastDefinition {
            config: self.config,
            source,
            registry: self.registry,
            key_cache: self.key_cache.unwrap_or_default(),
        }))
    }
}

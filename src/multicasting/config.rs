use serde::{Deserialize, Serialize};

use crate::core::{MulticastError, Result};

/// How the handlers of a record kind are constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityConvention {
    /// Built from the owner record, reads its state live.
    WithModel,
    /// Built from the owner record and the attribute name.
    WithModelAndName,
    /// Built from an owner handle, writes back on sync/save.
    Related,
    RelatedWithName,
    /// Built from the raw attribute value.
    SimpleArray,
    /// Built empty, then filled.
    #[default]
    Independent,
}

impl EntityConvention {
    /// Handlers of these conventions load their own state and are never
    /// filled from the raw attribute.
    pub fn is_self_initializing(&self) -> bool {
        matches!(
            self,
            Self::WithModel | Self::WithModelAndName | Self::Related | Self::RelatedWithName
        )
    }

    /// Construction needs the attribute name.
    pub fn requires_attribute_name(&self) -> bool {
        matches!(self, Self::WithModelAndName | Self::RelatedWithName | Self::SimpleArray)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithModel => "with_model",
            Self::WithModelAndName => "with_model_and_name",
            Self::Related => "related",
            Self::RelatedWithName => "related_with_name",
            Self::SimpleArray => "simple_array",
            Self::Independent => "independent",
        }
    }
}

/// Settings of one record kind.
///
/// ```ignore
/// let config = MulticastConfig::new()
///     .property_for_entity("values")
///     .source_with_entity_type("af.type|additional_field_id")
///     .interface_type(EntityConvention::SimpleArray);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MulticastConfig {
    /// Raw attribute holding the entity data
    pub property_for_entity: Option<String>,

    /// `<path>` or `<path>|<cache-key-field>`
    pub source_with_entity_type: Option<String>,

    pub interface_type: EntityConvention,

    /// Pass the type and the attribute name to handlers that keep them
    pub configure_instance: bool,

    /// Fill handlers from the raw attribute after construction
    pub fill_instance: bool,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            property_for_entity: None,
            source_with_entity_type: None,
            interface_type: EntityConvention::default(),
            configure_instance: true,
            fill_instance: true,
        }
    }
}

impl MulticastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property_for_entity(mut self, property: &str) -> Self {
        self.property_for_entity = Some(property.to_string());
        self
    }

    pub fn source_with_entity_type(mut self, source: &str) -> Self {
        self.source_with_entity_type = Some(source.to_string());
        self
    }

    pub fn interface_type(mut self, convention: EntityConvention) -> Self {
        self.interface_type = convention;
        self
    }

    pub fn configure_instance(mut self, enabled: bool) -> Self {
        self.configure_instance = enabled;
        self
    }

    pub fn fill_instance(mut self, enabled: bool) -> Self {
        self.fill_instance = enabled;
        self
    }

    /// Parses a JSON settings object; omitted fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that can never work.
    ///
    /// An absent property or source is allowed here and reported on
    /// first use.
    pub fn validate(&self) -> Result<()> {
        if let Some(property) = &self.property_for_entity
            && property.trim().is_empty()
        {
            return Err(MulticastError::InvalidConfig(
                "property_for_entity cannot be empty".to_string(),
            ));
        }

        if let Some(source) = &self.source_with_entity_type
            && source.trim().is_empty()
        {
            return Err(MulticastError::InvalidConfig(
                "source_with_entity_type cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

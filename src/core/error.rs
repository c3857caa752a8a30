use thiserror::Error;

use super::Capability;

#[derive(Error, Debug)]
pub enum MulticastError {
    #[error("The variable with a source of a type was not assigned")]
    UndefinedSourceOfType,

    #[error("The entity type mapping is undefined")]
    UndefinedEntityTypeMapping,

    #[error("The variable with a property for entities was not assigned")]
    UndefinedPropertyForEntities,

    #[error("The current instance is undefined")]
    UndefinedCurrentInstance,

    #[error("The given instance has another type in comparison with the current instance")]
    DifferentTypesOfEntities,

    #[error("The given instance is invalid interface. The instance must implement {0}")]
    InvalidTypeOfInstance(Capability),

    #[error("Invalid source of an entity type '{0}'")]
    InvalidSource(String),

    #[error("Handler '{class}' for type '{entity_type}' is {actual}, expected {expected}")]
    IncompatibleHandler {
        entity_type: String,
        class: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MulticastError>;

impl<T> From<std::sync::PoisonError<T>> for MulticastError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

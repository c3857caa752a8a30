pub mod error;
pub mod types;
pub mod value;

pub use error::{MulticastError, Result};
pub use types::{Capability, DEFAULT_PRIMARY_KEY, EntityArray, Record, RecordRef};
pub use value::Value;

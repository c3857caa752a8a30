pub mod catalog;
pub mod engine;
pub mod memory;
pub mod table;

pub use catalog::{Catalog, Relation, RelationKind, TableSchema};
pub use engine::RecordStore;
pub use memory::MemoryStore;
pub use table::Table;

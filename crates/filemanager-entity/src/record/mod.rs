//! Hierarchical record entities (database backend).

pub mod file_type;
pub mod model;

pub use file_type::FileType;
pub use model::{ItemRecord, NewItemRecord};

//! The uniform item abstraction.

pub mod database;
pub mod model;
pub mod storage;

pub use database::DatabaseItem;
pub use model::{FileManagerItem, ItemKind, ItemSummary};
pub use storage::StorageItem;

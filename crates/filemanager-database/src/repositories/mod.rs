//! Repository implementations for the metadata table.

pub mod item;

pub use item::{ItemRepository, ItemTx};

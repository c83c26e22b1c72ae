//! # filemanager-entity
//!
//! Domain models for the file manager. [`FileManagerItem`] is the uniform
//! description of one file or folder that both adapters hand to callers;
//! [`ItemRecord`] is the hierarchical row the database adapter persists.

pub mod item;
pub mod record;
pub mod tree;

pub use item::{DatabaseItem, FileManagerItem, ItemKind, ItemSummary, StorageItem};
pub use record::{FileType, ItemRecord, NewItemRecord};
pub use tree::{Breadcrumb, FolderNode};

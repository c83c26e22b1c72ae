//! Core traits defined in `filemanager-core` and implemented by other crates.

pub mod disk;

pub use disk::{ByteStream, Disk, DiskObjectMeta};

//! # filemanager-storage
//!
//! Disk drivers for the file manager (local filesystem and an in-process
//! object store), the named [`DiskManager`], the [`PathResolver`] that
//! confines user paths to a root, URL signing, and image thumbnails.

pub mod manager;
pub mod path;
pub mod providers;
pub mod signing;
pub mod thumbnail;

pub use manager::DiskManager;
pub use path::PathResolver;
pub use signing::UrlSigner;
pub use thumbnail::ThumbnailGenerator;

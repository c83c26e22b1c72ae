//! # filemanager-service
//!
//! The file manager's storage abstraction. Both adapters implement
//! [`FileManagerAdapter`]; [`AdapterFactory`] picks one from configuration.
//!
//! Adapters are built with constructor injection: the disk, database pool,
//! and configuration sections they need are handed over at construction.

pub mod adapter;
pub mod factory;
pub mod security;
pub mod url;

pub use adapter::{DatabaseAdapter, FileManagerAdapter, StorageAdapter};
pub use factory::AdapterFactory;
pub use filemanager_core::types::RequestContext;
pub use security::FileSecurityService;
pub use url::{FileUrlService, UrlStrategy};

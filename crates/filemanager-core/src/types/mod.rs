//! Shared value types used across the file manager crates.

pub mod context;
pub mod mode;
pub mod upload;

pub use context::RequestContext;
pub use mode::AdapterMode;
pub use upload::UploadedFile;

//! # filemanager-core
//!
//! Core crate for the file manager. Contains the disk trait,
//! configuration schemas, shared value types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other file manager crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;

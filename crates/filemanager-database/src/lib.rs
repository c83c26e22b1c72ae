//! # filemanager-database
//!
//! Connection management for the metadata database (PostgreSQL in
//! production, SQLite embedded) and the lock-aware repository the database
//! adapter runs its transactions through.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::{DatabasePool, Dialect};
pub use repositories::{ItemRepository, ItemTx};

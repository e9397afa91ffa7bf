//! Package database for the ember package manager
//!
//! The resolver consumes the database as a read-only oracle through the
//! `PackageStore` trait. This crate provides the trait, an in-memory
//! implementation with surrogate-id assignment, and a TOML snapshot loader
//! for repository and installed-state files.

pub mod memory;
pub mod snapshot;
pub mod store;

// Re-export main types
pub use memory::MemoryStore;
pub use store::{PackageQuery, PackageStore};

//! # ember-core
//!
//! Core types and utilities shared across all ember crates.
//!
//! This crate provides:
//! - The `Package` record with its static and conditional dependency buckets
//! - Atom comparator, gate and decision-point types used by the resolver
//! - The `EmberError` enum for unified error handling
//! - The version comparator that defines the total order over version strings
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: core data types (Package, DepBundle, OperationPlan, ...)
//! - `error`: error types and result aliases
//! - `version`: version string parsing and comparison

pub mod error;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use error::{EmberError, EmberResult};
pub use types::{
    BundleEntry, Cmp, DecisionPoint, DepBundle, Gate, GateTerm, OperationPlan, Package, PackageKey,
};

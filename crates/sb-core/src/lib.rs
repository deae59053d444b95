//! sb-core: shared error type and application configuration.
//!
//! This crate is the foundational dependency for all other sb-* crates.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};

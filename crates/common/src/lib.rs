//! Storefront E2E Common Library
//!
//! Shared types for the run lifecycle and report orchestration crates.

pub mod error;
pub mod properties;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

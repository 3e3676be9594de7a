//! Error types shared by the storefront harness crates

use thiserror::Error;

/// Result type alias using the shared harness Error
pub type Result<T> = std::result::Result<T, Error>;

/// Shared error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid properties: {0}")]
    InvalidProperties(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}

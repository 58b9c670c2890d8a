//! BindFlow Common Library
//!
//! Shared functionality for the BindFlow workspace:
//!
//! - **Error Handling**: the shared error type and result alias
//! - **Hashing**: content hashing for run idempotency
//! - **Logging**: structured logging configuration and initialization

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod hash;
pub mod logging;

// Re-export commonly used types
pub use error::{BindflowError, Result};

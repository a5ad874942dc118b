//! PoseWatch Common Utilities
//!
//! Shared infrastructure for all PoseWatch crates:
//! - Error types and result aliases
//! - Session clock for stamping observations
//! - Tracing/logging initialization
//! - Configuration loading and validation

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

//! Request defaults and CLI configuration.
//!
//! This module provides:
//! - Default constants (timeouts, redirect budget, boundary length, etc.)
//! - HTTP header name and content-type constants
//! - CLI option types and parsing

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{LogFormat, LogLevel, Opt, OutputFormat};

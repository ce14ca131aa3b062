//! Error types.
//!
//! Every failure a request can produce is a [`RequestError`]; failures while
//! setting up logging or the async worker pool are [`InitializationError`]s.

mod types;

// Re-export public API
pub use types::{InitializationError, RequestError};

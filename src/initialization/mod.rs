//! Process-wide setup.
//!
//! Logging is the only global state this crate installs; worker pools are
//! owned values created through [`crate::fetch::Dispatcher`].

mod logger;

// Re-export public API
pub use logger::init_logger_with;

//! http_request library: blocking HTTP requests with redirect tracking
//!
//! This library wraps a single HTTP exchange and everything around it: it
//! follows redirects itself so every hop is recorded, replays cookies across
//! hops and executions, serializes form data as URL-encoded or multipart
//! bodies, and detects the response charset by decode validation when the
//! server does not declare one. Requests can also be handed to a small worker
//! pool and awaited or observed through callbacks.
//!
//! # Example
//!
//! ```no_run
//! use http_request::{form_data, HttpRequest, Method};
//!
//! # fn main() -> Result<(), http_request::RequestError> {
//! let mut request = HttpRequest::new("https://example.com/search");
//! request.execute(Method::Get, Some(form_data("q", "rust").data("page", 2)))?;
//!
//! println!("{} after {} hop(s)", request.status().unwrap_or_default(), request.redirects().len());
//! if request.has_text_body()? {
//!     println!("{}", request.body()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Async
//!
//! ```no_run
//! use http_request::{Dispatcher, HttpRequest, Job, Method};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new()?;
//! let submission = dispatcher.submit(Job::new(HttpRequest::new("https://example.com"), Method::Get));
//! let request = submission.wait()?;
//! println!("{:?}", request.status());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
mod error_handling;
pub mod fetch;
pub mod initialization;

// Re-export public API
pub use error_handling::{InitializationError, RequestError};
pub use fetch::{
    form_data, Charset, CookieJar, Dispatcher, FormData, HttpRequest, Job, Method, Outcome,
    ProxyKind, ProxyRef, Submission,
};

//! Request defaults.
//!
//! Every `HttpRequest` starts from these values; callers override them per request.

use std::time::Duration;

/// Connect and read timeout applied to every hop of a request (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// Redirect handling
/// Maximum number of redirect hops followed after the first request.
/// The redirect engine performs at most `MAX_REDIRECT_HOPS + 1` exchanges.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Buffer size used when draining a response stream (16KB).
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Name of the default text encoding, used for form encoding and as the
/// charset parameter of the default form content type.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Length of a generated multipart boundary.
pub const MIME_BOUNDARY_LENGTH: usize = 32;

/// Alphabet generated multipart boundaries are drawn from.
pub const MIME_BOUNDARY_CHARS: &[u8] =
    b"-_1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of worker threads in an async dispatcher.
pub const ASYNC_WORKER_THREADS: usize = 3;

/// Default User-Agent string sent with every request unless the caller overrides it.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// HTTP status codes (for clarity and consistency)
/// 200 OK
pub const HTTP_STATUS_OK: u16 = 200;
/// 300 Multiple Choices, the lowest redirect status followed
pub const HTTP_STATUS_MULTIPLE_CHOICES: u16 = 300;
/// 304 Not Modified, never followed
pub const HTTP_STATUS_NOT_MODIFIED: u16 = 304;
/// 306 (unused), never followed
pub const HTTP_STATUS_UNUSED: u16 = 306;
/// 307 Temporary Redirect, the only redirect that keeps method and body
pub const HTTP_STATUS_TEMPORARY_REDIRECT: u16 = 307;
/// 400 Bad Request, the lowest "bad" status
pub const HTTP_STATUS_BAD_REQUEST: u16 = 400;

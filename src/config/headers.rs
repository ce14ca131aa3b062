//! HTTP header name and content-type constants.

use super::constants::DEFAULT_USER_AGENT;

// Request & response header names
/// User-Agent request header
pub const USER_AGENT: &str = "User-Agent";
/// Accept-Encoding request header
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
/// Cookie request header
pub const COOKIE: &str = "Cookie";
/// Location response header (redirect target)
pub const LOCATION: &str = "Location";
/// Content-Type header
pub const CONTENT_TYPE: &str = "Content-Type";
/// Content-Encoding response header
pub const CONTENT_ENCODING: &str = "Content-Encoding";
/// Set-Cookie response header
pub const SET_COOKIE: &str = "Set-Cookie";

// Partial content
/// Range request header, e.g. `Range: bytes=0-499`, `bytes=-500`, `bytes=500-`
pub const HEADER_RANGE: &str = "Range";
/// Content-Range response header, e.g. `Content-Range: bytes 0-100/100`
pub const HEADER_CONTENT_RANGE: &str = "Content-Range";
/// Accept-Ranges response header, `Accept-Ranges: bytes` when ranges are served
pub const HEADER_ACCEPT_RANGES: &str = "Accept-Ranges";
/// Range unit understood by `Accept-Ranges`
pub const HEADER_VALUE_BYTES: &str = "bytes";

// Content types
/// multipart/form-data content type
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
/// application/x-www-form-urlencoded content type
pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Headers sent first on every request, before any caller-supplied header.
pub const DEFAULT_REQUEST_HEADERS: &[(&str, &str)] = &[
    (USER_AGENT, DEFAULT_USER_AGENT),
    (ACCEPT_ENCODING, "gzip, deflate"),
];

//! Request execution.
//!
//! This module contains the request engine and its supporting pieces:
//! - `redirects`: the redirect-following state machine
//! - `body`: URL-encoded and multipart body serialization
//! - `cookies`: the cookie jar and its merge/replay rules
//! - `charset`: charset resolution by header or by decode validation
//! - `response`: content decoding and lazy body loading
//! - `request`: the `HttpRequest` facade
//! - `dispatch`: async execution on a bounded worker pool
//! - `transport`: the network collaborator and its reqwest implementation

mod body;
mod charset;
mod cookies;
mod data;
mod dispatch;
mod headers;
mod method;
mod redirects;
mod request;
mod response;
mod transport;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use body::{
    decide_body_encoding, encode_body, encode_multipart, encode_url_form, fold_into_query,
    mime_boundary, BodyEncoding,
};
pub use charset::{
    encoding_from_content_type, guess_encoding, is_text_content_type, resolve_charset, Charset,
    DEFAULT_CHARSET, PROBE_CANDIDATES,
};
pub use cookies::{cookies_from, merge_set_cookies, to_cookie_header, CookieJar, CookieMap};
pub use data::{form_data, FormData};
pub use dispatch::{Dispatcher, Job, Outcome, Submission};
pub use headers::{parse_header_line, RequestHeaders};
pub use method::Method;
pub use redirects::{is_redirect_status, open_with_redirects, validate_scheme, Exchange};
pub use request::HttpRequest;
pub use response::{decode_stream, has_header_with_value, is_breakpoint_available, LoadedBody};
pub use transport::{
    first_header, header_values, Connection, HttpConnection, HttpTransport, ProxyKind, ProxyRef,
    Transport,
};

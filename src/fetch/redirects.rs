//! Redirect-following request execution.
//!
//! Transport-level redirects are disabled; this module follows them itself so
//! that every hop is recorded, cookies are replayed on each hop and the
//! method/body demotion rules are applied.

use std::time::Duration;

use log::{debug, warn};
use url::Url;

use crate::config::{
    CONTENT_TYPE, COOKIE, HTTP_STATUS_MULTIPLE_CHOICES, HTTP_STATUS_NOT_MODIFIED,
    HTTP_STATUS_TEMPORARY_REDIRECT, HTTP_STATUS_UNUSED, LOCATION, SET_COOKIE,
};
use crate::error_handling::RequestError;
use crate::fetch::body::{decide_body_encoding, encode_body, fold_into_query};
use crate::fetch::transport::{first_header, header_values, Connection, ProxyRef, Transport};
use crate::fetch::{CookieJar, Method};

/// Everything one execution needs apart from the transport.
pub struct Exchange<'a> {
    /// Initial URL, already parsed
    pub url: Url,
    /// Proxy applied to every hop
    pub proxy: Option<&'a ProxyRef>,
    /// Method of the first hop
    pub method: Method,
    /// Connect and read timeout of each hop
    pub timeout: Duration,
    /// Redirects followed after the first request; 0 disables following
    pub max_redirects: usize,
    /// Finalized request headers, applied in order
    pub headers: &'a [(String, String)],
    /// Form pairs to send
    pub data: Vec<(String, String)>,
    /// Jar read before and updated after every hop
    pub cookies: &'a CookieJar,
}

/// Loop-local state threaded through each hop.
struct Hop {
    url: Url,
    method: Method,
    pending: Vec<(String, String)>,
}

/// True for the redirect statuses this engine follows: 300-307 except 304 and 306.
pub fn is_redirect_status(status: u16) -> bool {
    (HTTP_STATUS_MULTIPLE_CHOICES..=HTTP_STATUS_TEMPORARY_REDIRECT).contains(&status)
        && status != HTTP_STATUS_UNUSED
        && status != HTTP_STATUS_NOT_MODIFIED
}

/// Rejects anything but http and https before any network I/O.
pub fn validate_scheme(url: &Url) -> Result<(), RequestError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(RequestError::malformed(
            url.as_str(),
            "only http & https protocols supported",
        )),
    }
}

/// Performs the exchange, following up to `max_redirects` redirects.
///
/// Every requested URL is appended to `trail`, including the final one.
/// Superseded connections are disconnected before the next hop; the returned
/// connection is the final one and still holds its response body.
///
/// # Errors
///
/// - `MalformedEndpoint` for a non-http(s) URL or an unparsable `Location`
/// - `IllegalRedirect` for a redirect status without `Location`
/// - `TooManyRedirects` when the budget runs out
/// - `Network` for anything the transport reports
pub fn open_with_redirects(
    transport: &dyn Transport,
    exchange: Exchange<'_>,
    trail: &mut Vec<Url>,
) -> Result<Box<dyn Connection>, RequestError> {
    validate_scheme(&exchange.url)?;

    let mut hop = Hop {
        url: exchange.url,
        method: exchange.method,
        pending: exchange.data,
    };
    let mut redirects = 0usize;

    loop {
        if !hop.method.has_body() && !hop.pending.is_empty() {
            fold_into_query(&mut hop.url, &hop.pending);
            // moved into the url; never resent on a later hop
            hop.pending.clear();
        }

        let mut conn = transport.open(&hop.url, exchange.proxy)?;
        conn.set_method(hop.method);
        conn.set_timeout(exchange.timeout);
        conn.set_follow_redirects(false);
        if !exchange.cookies.is_empty() {
            conn.set_header(COOKIE, &exchange.cookies.to_cookie_header());
        }
        for (name, value) in exchange.headers {
            conn.set_header(name, value);
        }

        if hop.method.has_body() {
            let encoding = decide_body_encoding(conn.request_header(CONTENT_TYPE));
            if let Some(content_type) = &encoding.content_type {
                conn.set_header(CONTENT_TYPE, content_type);
            }
            let body = encode_body(&hop.pending, encoding.boundary.as_deref());
            conn.connect(Some(&body))?;
        } else {
            conn.connect(None)?;
        }
        trail.push(hop.url.clone());

        {
            let headers = conn.response_headers()?;
            let set_cookies = header_values(headers, SET_COOKIE);
            if !set_cookies.is_empty() {
                exchange
                    .cookies
                    .merge_set_cookies(set_cookies.iter().map(|v| &**v));
            }
        }

        let status = conn.status()?;
        debug!("{} {} -> {}", hop.method, hop.url, status);

        if exchange.max_redirects == 0 || !is_redirect_status(status) {
            return Ok(conn);
        }

        let location = first_header(conn.response_headers()?, LOCATION).map(|loc| loc.into_owned());
        let target = location.as_deref().map(|loc| conn.url().join(loc));
        conn.disconnect();

        let target = match target {
            Some(Ok(target)) => target,
            Some(Err(e)) => {
                return Err(RequestError::malformed(location.unwrap_or_default(), e));
            }
            None => {
                warn!(
                    "Redirect status {} for {} but no Location header",
                    status, hop.url
                );
                return Err(RequestError::IllegalRedirect {
                    status,
                    url: hop.url.to_string(),
                });
            }
        };

        validate_scheme(&target)?;

        // only a temporary redirect replays the method and body
        if status != HTTP_STATUS_TEMPORARY_REDIRECT {
            hop.pending.clear();
            hop.method = Method::Get;
        }
        hop.url = target;
        redirects += 1;
        if redirects > exchange.max_redirects {
            break;
        }
    }

    Err(RequestError::TooManyRedirects {
        attempted: redirects,
    })
}

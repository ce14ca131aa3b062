//! The request facade.
//!
//! `HttpRequest` holds the endpoint and per-request configuration, runs the
//! redirect engine on `execute`, and exposes the final response. The body is
//! read eagerly by default; with [`HttpRequest::lazy_body`] it is read on the
//! first accessor that needs it, or handed out raw via
//! [`HttpRequest::take_body_stream`].
//!
//! A single `HttpRequest` must not be executed from several threads at once.
//! Its cookie jar may be shared deliberately through [`CookieJar`] handles.

use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::header::HeaderMap;
use url::Url;

use crate::config::{DEFAULT_TIMEOUT, HTTP_STATUS_BAD_REQUEST, HTTP_STATUS_OK, MAX_REDIRECT_HOPS};
use crate::error_handling::RequestError;
use crate::fetch::charset::Charset;
use crate::fetch::headers::RequestHeaders;
use crate::fetch::redirects::{open_with_redirects, Exchange};
use crate::fetch::response::{
    decode_stream, has_header_with_value, is_breakpoint_available, BodyState, LoadedBody,
};
use crate::fetch::transport::{header_values, HttpTransport, ProxyRef, Transport};
use crate::fetch::{CookieJar, FormData, Method};

/// Response of the last execution. Set as a whole, never piecemeal.
struct ResponseState {
    url: Url,
    redirects: Vec<Url>,
    status: u16,
    headers: HeaderMap,
    body: BodyState,
}

/// One HTTP request that can be executed repeatedly.
pub struct HttpRequest {
    origin: String,
    proxy: Option<ProxyRef>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    headers: RequestHeaders,
    follow_redirects: bool,
    max_redirects: usize,
    lazy_body: bool,
    cookies: Option<CookieJar>,
    response: Option<ResponseState>,
}

impl HttpRequest {
    /// Creates a request for `url` using the default transport.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(url, None, Arc::new(HttpTransport))
    }

    /// Creates a request routed through `proxy` on every hop.
    pub fn with_proxy(url: impl Into<String>, proxy: ProxyRef) -> Self {
        Self::with_transport(url, Some(proxy), Arc::new(HttpTransport))
    }

    /// Creates a request over a custom transport.
    pub fn with_transport(
        url: impl Into<String>,
        proxy: Option<ProxyRef>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            origin: url.into(),
            proxy,
            transport,
            timeout: DEFAULT_TIMEOUT,
            headers: RequestHeaders::default(),
            follow_redirects: true,
            max_redirects: MAX_REDIRECT_HOPS,
            lazy_body: false,
            cookies: None,
            response: None,
        }
    }

    /// Connect and read timeout of every hop.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Caller headers for the next execution only, sent after the defaults.
    pub fn headers<K, V, I>(&mut self, headers: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.headers
            .set(headers.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Whether redirects are followed at all.
    pub fn follow_redirects(&mut self, follow: bool) -> &mut Self {
        self.follow_redirects = follow;
        self
    }

    /// How many redirects are followed when following is enabled.
    pub fn max_redirects(&mut self, max: usize) -> &mut Self {
        self.max_redirects = max;
        self
    }

    /// Defer reading the body until an accessor needs it.
    pub fn lazy_body(&mut self, lazy: bool) -> &mut Self {
        self.lazy_body = lazy;
        self
    }

    /// Replaces the cookie jar. The jar handle is shared, not copied.
    pub fn cookie_jar(&mut self, jar: CookieJar) -> &mut Self {
        self.cookies = Some(jar);
        self
    }

    /// `GET` without data.
    pub fn get(&mut self) -> Result<&mut Self, RequestError> {
        self.execute(Method::Get, None)
    }

    /// `GET` with data folded into the query.
    pub fn get_with(&mut self, params: FormData) -> Result<&mut Self, RequestError> {
        self.execute(Method::Get, Some(params))
    }

    /// Same as [`HttpRequest::get`].
    pub fn exec(&mut self) -> Result<&mut Self, RequestError> {
        self.get()
    }

    /// Executes the request, following redirects.
    ///
    /// Previous response state is discarded first. The cookie jar is created
    /// on the first execution and kept afterwards, so cookies accumulate.
    pub fn execute(&mut self, method: Method, data: Option<FormData>) -> Result<&mut Self, RequestError> {
        self.response = None;
        let url = Url::parse(&self.origin).map_err(|e| RequestError::malformed(&self.origin, e))?;
        let cookies = self.cookies.get_or_insert_with(CookieJar::new).clone();
        let headers = self.headers.finalize();
        let max_redirects = if self.follow_redirects {
            self.max_redirects
        } else {
            0
        };

        let mut redirects = Vec::new();
        let mut conn = open_with_redirects(
            self.transport.as_ref(),
            Exchange {
                url,
                proxy: self.proxy.as_ref(),
                method,
                timeout: self.timeout,
                max_redirects,
                headers: &headers,
                data: data.map(FormData::into_pairs).unwrap_or_default(),
                cookies: &cookies,
            },
            &mut redirects,
        )?;

        let status = conn.status()?;
        let response_headers = conn.response_headers()?.clone();
        let url = conn.url().clone();
        let stream = decode_stream(conn.body_stream()?, &response_headers)?;
        debug!(
            "{} {} finished with {} after {} hop(s)",
            method,
            url,
            status,
            redirects.len()
        );

        self.response = Some(ResponseState {
            url,
            redirects,
            status,
            headers: response_headers,
            body: BodyState::Pending { stream, conn },
        });
        if !self.lazy_body {
            self.load_response()?;
        }
        Ok(self)
    }

    /// Reads the body if that has not happened yet.
    ///
    /// # Errors
    ///
    /// `InvalidState` before any execution or after the raw stream was taken;
    /// `UnsupportedCharset` when the declared charset is unknown.
    pub fn load_response(&mut self) -> Result<&mut Self, RequestError> {
        self.loaded()?;
        Ok(self)
    }

    fn loaded(&mut self) -> Result<&LoadedBody, RequestError> {
        let response = self
            .response
            .as_mut()
            .ok_or(RequestError::InvalidState("request not yet executed"))?;
        response.body.load(&response.headers)
    }

    /// Hands the content-decoded body stream to the caller. Body accessors
    /// fail afterwards.
    pub fn take_body_stream(&mut self) -> Result<Box<dyn Read + Send>, RequestError> {
        self.response
            .as_mut()
            .ok_or(RequestError::InvalidState("request not yet executed"))?
            .body
            .take_stream()
    }

    /// Final URL after redirects.
    pub fn url(&self) -> Option<&Url> {
        self.response.as_ref().map(|r| &r.url)
    }

    /// The URL this request was created with.
    pub fn origin_url(&self) -> &str {
        &self.origin
    }

    /// Proxy applied to every hop.
    pub fn proxy(&self) -> Option<&ProxyRef> {
        self.proxy.as_ref()
    }

    /// Every URL requested by the last execution, final one last.
    pub fn redirects(&self) -> &[Url] {
        self.response.as_ref().map_or(&[], |r| r.redirects.as_slice())
    }

    /// The cookie jar, once one exists.
    pub fn cookies(&self) -> Option<&CookieJar> {
        self.cookies.as_ref()
    }

    /// The cookie jar, created empty if none exists yet. Cookies inserted
    /// here are sent by the next execution.
    pub fn cookies_mut(&mut self) -> &CookieJar {
        self.cookies.get_or_insert_with(CookieJar::new)
    }

    /// Status code of the final response.
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }

    /// Headers of the final response.
    pub fn response_headers(&self) -> Option<&HeaderMap> {
        self.response.as_ref().map(|r| &r.headers)
    }

    /// All values of a response header (case-insensitive name).
    pub fn header(&self, name: &str) -> Vec<String> {
        self.response_headers()
            .map(|headers| {
                header_values(headers, name)
                    .into_iter()
                    .map(|v| v.into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when a response header has `value`, ignoring case.
    pub fn has_header_with_value(&self, name: &str, value: &str) -> bool {
        self.response_headers()
            .is_some_and(|headers| has_header_with_value(headers, name, value))
    }

    /// True when the server supports partial content (resumable downloads).
    pub fn is_breakpoint_available(&self) -> bool {
        self.response_headers().is_some_and(is_breakpoint_available)
    }

    /// True when the status is below 200 or at least 400, or nothing was executed.
    pub fn is_bad_status(&self) -> bool {
        match self.status() {
            Some(status) => !(HTTP_STATUS_OK..HTTP_STATUS_BAD_REQUEST).contains(&status),
            None => true,
        }
    }

    /// Charset of the body, `None` for binary content.
    pub fn encoding(&mut self) -> Result<Option<Charset>, RequestError> {
        Ok(self.loaded()?.charset)
    }

    /// Raw body bytes.
    pub fn body_bytes(&mut self) -> Result<&[u8], RequestError> {
        Ok(&self.loaded()?.bytes)
    }

    /// Body text, or an empty string when there is no text body.
    pub fn body(&mut self) -> Result<&str, RequestError> {
        Ok(self.loaded()?.text.as_deref().unwrap_or_default())
    }

    /// True when the body has no bytes.
    pub fn is_body_empty(&mut self) -> Result<bool, RequestError> {
        Ok(self.loaded()?.bytes.is_empty())
    }

    /// True when a charset was resolved and the body is non-empty.
    pub fn has_text_body(&mut self) -> Result<bool, RequestError> {
        Ok(self.loaded()?.text.is_some())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("origin", &self.origin)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("follow_redirects", &self.follow_redirects)
            .field("status", &self.status())
            .field("url", &self.url().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

//! Transport collaborator.
//!
//! The redirect engine talks to the network only through [`Transport`] and
//! [`Connection`]. [`HttpTransport`] is the production implementation over
//! `reqwest::blocking`; tests substitute a scripted one.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use clap::ValueEnum;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use url::Url;

use crate::config::{DEFAULT_TIMEOUT, MAX_REDIRECT_HOPS};
use crate::error_handling::RequestError;
use crate::fetch::Method;

/// Kind of forwarding proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ProxyKind {
    /// HTTP proxy (CONNECT for https targets)
    Http,
    /// SOCKS5 proxy
    Socks5,
}

/// A forwarding proxy applied to every hop of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyRef {
    /// Proxy protocol
    pub kind: ProxyKind,
    /// Proxy host name or address
    pub host: String,
    /// Proxy port
    pub port: u16,
}

impl ProxyRef {
    /// Creates a proxy reference.
    pub fn new(kind: ProxyKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
        }
    }

    /// Parses `host:port`.
    pub fn parse(kind: ProxyKind, address: &str) -> Result<Self, RequestError> {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| RequestError::malformed(address, "proxy must be host:port"))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| RequestError::malformed(address, e))?;
        if host.is_empty() {
            return Err(RequestError::malformed(address, "proxy host is empty"));
        }
        Ok(Self::new(kind, host, port))
    }

    /// Proxy URL in the form reqwest expects.
    pub fn url(&self) -> String {
        let scheme = match self.kind {
            ProxyKind::Http => "http",
            ProxyKind::Socks5 => "socks5",
        };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl fmt::Display for ProxyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Opens connections. Implementations must not touch the network in `open`.
pub trait Transport: Send + Sync {
    /// Creates an unconnected handle for `url`, routed through `proxy` if given.
    fn open(&self, url: &Url, proxy: Option<&ProxyRef>) -> Result<Box<dyn Connection>, RequestError>;
}

/// One request/response exchange.
///
/// Configure with the setters, then `connect` performs the exchange; the
/// response accessors are valid afterwards.
pub trait Connection: Send {
    /// URL this connection was opened for.
    fn url(&self) -> &Url;
    /// Sets the request method.
    fn set_method(&mut self, method: Method);
    /// Sets both connect and read timeouts.
    fn set_timeout(&mut self, timeout: Duration);
    /// Enables or disables transport-level redirect following.
    fn set_follow_redirects(&mut self, follow: bool);
    /// Sets a request header, replacing any header of the same name.
    fn set_header(&mut self, name: &str, value: &str);
    /// Current value of a request header (case-insensitive).
    fn request_header(&self, name: &str) -> Option<&str>;
    /// Connects, writes `body` (when given) and reads the response head.
    fn connect(&mut self, body: Option<&[u8]>) -> Result<(), RequestError>;
    /// Response status code.
    fn status(&self) -> Result<u16, RequestError>;
    /// Response headers.
    fn response_headers(&self) -> Result<&HeaderMap, RequestError>;
    /// Takes the raw response body stream (error body included).
    fn body_stream(&mut self) -> Result<Box<dyn Read + Send>, RequestError>;
    /// Releases the connection.
    fn disconnect(&mut self);
}

/// Request headers with case-insensitive replace-on-set.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeaderList(Vec<(String, String)>);

impl HeaderList {
    pub(crate) fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }
}

/// Production transport backed by `reqwest::blocking`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn open(&self, url: &Url, proxy: Option<&ProxyRef>) -> Result<Box<dyn Connection>, RequestError> {
        Ok(Box::new(HttpConnection {
            url: url.clone(),
            proxy: proxy.cloned(),
            method: Method::Get,
            timeout: DEFAULT_TIMEOUT,
            follow_redirects: false,
            headers: HeaderList::default(),
            response: None,
            response_headers: None,
            status: None,
        }))
    }
}

/// A `reqwest::blocking` exchange.
pub struct HttpConnection {
    url: Url,
    proxy: Option<ProxyRef>,
    method: Method,
    timeout: Duration,
    follow_redirects: bool,
    headers: HeaderList,
    response: Option<reqwest::blocking::Response>,
    response_headers: Option<HeaderMap>,
    status: Option<u16>,
}

impl HttpConnection {
    fn client(&self) -> Result<reqwest::blocking::Client, RequestError> {
        let policy = if self.follow_redirects {
            Policy::limited(MAX_REDIRECT_HOPS)
        } else {
            Policy::none()
        };
        let mut builder = reqwest::blocking::Client::builder()
            .redirect(policy)
            .connect_timeout(self.timeout)
            .timeout(self.timeout);
        builder = match &self.proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy.url())?),
            None => builder.no_proxy(),
        };
        Ok(builder.build()?)
    }
}

impl Connection for HttpConnection {
    fn url(&self) -> &Url {
        &self.url
    }

    fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn set_follow_redirects(&mut self, follow: bool) {
        self.follow_redirects = follow;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    fn connect(&mut self, body: Option<&[u8]>) -> Result<(), RequestError> {
        let client = self.client()?;
        let mut request = client.request(self.method.into(), self.url.clone());
        for (name, value) in self.headers.iter() {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }
        debug!("{} {}", self.method, self.url);
        let response = request.send()?;
        self.status = Some(response.status().as_u16());
        self.response_headers = Some(response.headers().clone());
        self.response = Some(response);
        Ok(())
    }

    fn status(&self) -> Result<u16, RequestError> {
        self.status
            .ok_or(RequestError::InvalidState("connection not yet connected"))
    }

    fn response_headers(&self) -> Result<&HeaderMap, RequestError> {
        self.response_headers
            .as_ref()
            .ok_or(RequestError::InvalidState("connection not yet connected"))
    }

    fn body_stream(&mut self) -> Result<Box<dyn Read + Send>, RequestError> {
        let response = self
            .response
            .take()
            .ok_or(RequestError::InvalidState("response stream already taken"))?;
        Ok(Box::new(response))
    }

    fn disconnect(&mut self) {
        self.response = None;
    }
}

/// All values of a response header, as text. Values that are not valid
/// visible ASCII are decoded lossily.
pub fn header_values<'a>(headers: &'a HeaderMap, name: &str) -> Vec<std::borrow::Cow<'a, str>> {
    headers
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .collect()
}

/// First value of a response header, as text.
pub fn first_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<std::borrow::Cow<'a, str>> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_parse_and_url() {
        let proxy = ProxyRef::parse(ProxyKind::Http, "127.0.0.1:10809").unwrap();
        assert_eq!(proxy.host, "127.0.0.1");
        assert_eq!(proxy.port, 10809);
        assert_eq!(proxy.url(), "http://127.0.0.1:10809");
        let socks = ProxyRef::new(ProxyKind::Socks5, "proxy.local", 1080);
        assert_eq!(socks.to_string(), "socks5://proxy.local:1080");
    }

    #[test]
    fn test_proxy_parse_rejects_bad_input() {
        assert!(ProxyRef::parse(ProxyKind::Http, "no-port").is_err());
        assert!(ProxyRef::parse(ProxyKind::Http, "host:99999").is_err());
        assert!(ProxyRef::parse(ProxyKind::Http, ":8080").is_err());
    }

    #[test]
    fn test_header_list_replaces_case_insensitively() {
        let mut headers = HeaderList::default();
        headers.set("User-Agent", "a");
        headers.set("user-agent", "b");
        headers.set("Cookie", "x=1");
        assert_eq!(headers.get("USER-AGENT"), Some("b"));
        assert_eq!(headers.iter().count(), 2);
    }

    #[test]
    fn test_http_connection_unconnected_state() {
        let url = Url::parse("http://example.com/").unwrap();
        let mut conn = HttpTransport.open(&url, None).unwrap();
        assert_eq!(conn.url(), &url);
        assert!(conn.status().is_err());
        assert!(conn.response_headers().is_err());
        assert!(conn.body_stream().is_err());
        conn.set_header("Content-Type", "text/plain");
        assert_eq!(conn.request_header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_header_helpers() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", "a=1".parse().unwrap());
        headers.append("set-cookie", "b=2".parse().unwrap());
        assert_eq!(header_values(&headers, "Set-Cookie").len(), 2);
        assert_eq!(first_header(&headers, "SET-COOKIE").as_deref(), Some("a=1"));
        assert!(first_header(&headers, "Location").is_none());
    }
}

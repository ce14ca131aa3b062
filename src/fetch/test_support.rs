// Scripted in-memory transport shared by the fetch tests.

use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error_handling::RequestError;
use crate::fetch::transport::{Connection, HeaderList, ProxyRef, Transport};
use crate::fetch::Method;

/// A canned response.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub fail: Option<std::io::ErrorKind>,
}

impl Scripted {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            fail: None,
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::status(status).header("Location", location)
    }

    pub fn failure(kind: std::io::ErrorKind) -> Self {
        Self {
            fail: Some(kind),
            ..Self::status(0)
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// What the engine sent on one hop.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: Url,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub follow_redirects: bool,
    pub timeout: Duration,
    pub proxy: Option<ProxyRef>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(self.body.as_deref().unwrap_or_default()).into_owned()
    }
}

#[derive(Default)]
struct Shared {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Recorded>>,
    opened: AtomicUsize,
    disconnected: AtomicUsize,
}

/// Serves scripted responses in order, one per connect.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    shared: Arc<Shared>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        let transport = Self::default();
        transport.push(script);
        transport
    }

    pub fn push(&self, script: impl IntoIterator<Item = Scripted>) {
        self.shared.script.lock().unwrap().extend(script);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn disconnected(&self) -> usize {
        self.shared.disconnected.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn open(&self, url: &Url, proxy: Option<&ProxyRef>) -> Result<Box<dyn Connection>, RequestError> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            shared: Arc::clone(&self.shared),
            url: url.clone(),
            proxy: proxy.cloned(),
            method: Method::Get,
            timeout: Duration::ZERO,
            follow_redirects: true,
            headers: HeaderList::default(),
            response: None,
            response_headers: None,
            disconnected: false,
        }))
    }
}

struct ScriptedConnection {
    shared: Arc<Shared>,
    url: Url,
    proxy: Option<ProxyRef>,
    method: Method,
    timeout: Duration,
    follow_redirects: bool,
    headers: HeaderList,
    response: Option<Scripted>,
    response_headers: Option<HeaderMap>,
    disconnected: bool,
}

impl Connection for ScriptedConnection {
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
        self.shared.requests.lock().unwrap().push(Recorded {
            url: self.url.clone(),
            method: self.method,
            headers: self.headers.iter().cloned().collect(),
            body: body.map(<[u8]>::to_vec),
            follow_redirects: self.follow_redirects,
            timeout: self.timeout,
            proxy: self.proxy.clone(),
        });
        let next = self.shared.script.lock().unwrap().pop_front();
        let scripted = next.unwrap_or_else(|| Scripted::failure(std::io::ErrorKind::ConnectionRefused));
        if let Some(kind) = scripted.fail {
            return Err(RequestError::Io(std::io::Error::new(kind, "scripted failure")));
        }
        let mut map = HeaderMap::new();
        for (name, value) in &scripted.headers {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        self.response_headers = Some(map);
        self.response = Some(scripted);
        Ok(())
    }

    fn status(&self) -> Result<u16, RequestError> {
        self.response
            .as_ref()
            .map(|r| r.status)
            .ok_or(RequestError::InvalidState("not connected"))
    }

    fn response_headers(&self) -> Result<&HeaderMap, RequestError> {
        self.response_headers
            .as_ref()
            .ok_or(RequestError::InvalidState("not connected"))
    }

    fn body_stream(&mut self) -> Result<Box<dyn Read + Send>, RequestError> {
        let response = self
            .response
            .as_mut()
            .ok_or(RequestError::InvalidState("not connected"))?;
        Ok(Box::new(Cursor::new(std::mem::take(&mut response.body))))
    }

    fn disconnect(&mut self) {
        if !self.disconnected {
            self.disconnected = true;
            self.shared.disconnected.fetch_add(1, Ordering::SeqCst);
        }
    }
}

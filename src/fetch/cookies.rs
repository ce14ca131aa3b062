//! Cookie jar carried across redirects and repeated executions.
//!
//! Cookies are kept as the raw `Set-Cookie` text they arrived in. Attributes
//! (Path, Domain, Expires, ...) are retained but never interpreted; only the
//! value up to the first `;` is replayed in the `Cookie` request header.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

/// Cookie name to raw `Set-Cookie` value.
pub type CookieMap = BTreeMap<String, String>;

/// A shared handle to a cookie map.
///
/// Cloning the handle shares the map, so a jar handed to several requests
/// accumulates cookies from all of them. Iteration order is by cookie name.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<CookieMap>>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CookieMap> {
        // a panic while holding the lock cannot leave the map half-written
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raw `Set-Cookie` value stored under `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    /// Stores a raw value, replacing any previous one.
    pub fn insert(&self, name: impl Into<String>, raw: impl Into<String>) -> Option<String> {
        self.lock().insert(name.into(), raw.into())
    }

    /// Removes a cookie.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.lock().remove(name)
    }

    /// Removes every cookie.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cookies.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when the jar holds no cookie.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Cookie names in iteration order.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> CookieMap {
        self.lock().clone()
    }

    /// Folds `Set-Cookie` values into the jar (last write wins).
    pub fn merge_set_cookies<'a, I>(&self, set_cookie_values: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        merge_set_cookies(&mut self.lock(), set_cookie_values);
    }

    /// `Cookie` request header value for the current contents.
    pub fn to_cookie_header(&self) -> String {
        to_cookie_header(&self.lock())
    }
}

impl From<CookieMap> for CookieJar {
    fn from(map: CookieMap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }
}

/// Merges raw `Set-Cookie` values into `jar`.
///
/// The name is the text before the first `=`, trimmed; values with a blank
/// name are skipped. The whole raw value is stored.
pub fn merge_set_cookies<'a, I>(jar: &mut CookieMap, set_cookie_values: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for raw in set_cookie_values {
        let name = raw.split_once('=').map_or(raw, |(name, _)| name).trim();
        if name.is_empty() {
            continue;
        }
        debug!("Storing cookie {}", name);
        jar.insert(name.to_string(), raw.to_string());
    }
}

/// Parses response cookies into a fresh map, `None` when there are none.
pub fn cookies_from<'a, I>(set_cookie_values: I) -> Option<CookieMap>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut jar = CookieMap::new();
    let mut seen_any = false;
    for raw in set_cookie_values {
        seen_any = true;
        merge_set_cookies(&mut jar, std::iter::once(raw));
    }
    seen_any.then_some(jar)
}

/// Serializes a jar as a `Cookie` request header: `name=value` pairs joined
/// with `; `, where value is the raw text after the first `=` up to the next `;`.
pub fn to_cookie_header(jar: &CookieMap) -> String {
    jar.iter()
        .map(|(name, raw)| format!("{}={}", name, resendable_value(raw)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn resendable_value(raw: &str) -> &str {
    let Some((_, after_name)) = raw.split_once('=') else {
        return "";
    };
    after_name.split(';').next().unwrap_or_default().trim()
}

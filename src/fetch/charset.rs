//! Response charset resolution.
//!
//! The charset comes from the `Content-Type` parameter when present. Textual
//! content without one is probed: every candidate decoder validates the body in
//! parallel and the highest-priority candidate that accepts it wins.

use std::fmt;
use std::sync::mpsc;
use std::sync::{Arc, LazyLock};
use std::thread;

use encoding_rs::Encoding;
use log::{debug, trace};
use regex::Regex;

use crate::error_handling::RequestError;

/// Matches textual application types such as `application/javascript`,
/// `application/ecmascript` or `application/xml;charset=UTF8`.
static TEXT_CONTENT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:application|text)/\w*(?:xml|script).*$").expect("static pattern compiles")
});

/// A character encoding a response body can be decoded with.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8, the default encoding
    Utf8,
    /// ISO-8859-1 (Latin-1); every byte maps to the code point of the same value
    Iso8859_1,
    /// 7-bit US-ASCII
    UsAscii,
    /// GBK
    Gbk,
    /// Any other encoding known to `encoding_rs`
    Other(&'static Encoding),
}

/// Probe candidates in priority order.
pub const PROBE_CANDIDATES: [Charset; 4] =
    [Charset::Utf8, Charset::Iso8859_1, Charset::UsAscii, Charset::Gbk];

/// Encoding used when nothing better is known.
pub const DEFAULT_CHARSET: Charset = Charset::Utf8;

impl Charset {
    /// Looks up a charset by name or alias, case-insensitively.
    pub fn for_name(name: &str) -> Result<Self, RequestError> {
        let label = name.trim().trim_matches('"').trim();
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "iso8859_1" | "iso_8859_1" | "latin1" | "l1" => {
                Ok(Charset::Iso8859_1)
            }
            "us-ascii" | "ascii" | "us" | "iso646-us" => Ok(Charset::UsAscii),
            "gbk" => Ok(Charset::Gbk),
            other => Encoding::for_label(other.as_bytes())
                .map(|encoding| {
                    if encoding == encoding_rs::GBK {
                        Charset::Gbk
                    } else if encoding == encoding_rs::UTF_8 {
                        Charset::Utf8
                    } else {
                        Charset::Other(encoding)
                    }
                })
                .ok_or_else(|| RequestError::UnsupportedCharset(name.to_string())),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::UsAscii => "US-ASCII",
            Charset::Gbk => "GBK",
            Charset::Other(encoding) => encoding.name(),
        }
    }

    /// True when `bytes` decode under this charset without a single malformed sequence.
    pub fn validates(&self, bytes: &[u8]) -> bool {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes).is_ok(),
            Charset::Iso8859_1 => true,
            Charset::UsAscii => bytes.is_ascii(),
            Charset::Gbk => encoding_rs::GBK
                .decode_without_bom_handling_and_without_replacement(bytes)
                .is_some(),
            Charset::Other(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .is_some(),
        }
    }

    /// Decodes `bytes`, replacing malformed sequences.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::UsAscii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            Charset::Gbk => encoding_rs::GBK
                .decode_without_bom_handling(bytes)
                .0
                .into_owned(),
            Charset::Other(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        }
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charset({})", self.name())
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// True for `text/*` and for script or xml application types.
pub fn is_text_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("text/") || TEXT_CONTENT_TYPE.is_match(ct))
}

/// Charset named by the `charset=` parameter of a content type, if any.
pub fn encoding_from_content_type(content_type: Option<&str>) -> Result<Option<Charset>, RequestError> {
    let Some(content_type) = content_type else {
        return Ok(None);
    };
    let lowered = content_type.to_ascii_lowercase();
    for param in lowered.split(';') {
        if let Some(name) = param.trim().strip_prefix("charset=") {
            return Charset::for_name(name).map(Some);
        }
    }
    Ok(None)
}

/// Resolves the charset of a response body.
///
/// Returns `None` for binary content, in which case no text view is built.
pub fn resolve_charset(content_type: Option<&str>, body: &[u8]) -> Result<Option<Charset>, RequestError> {
    if let Some(charset) = encoding_from_content_type(content_type)? {
        debug!("Charset {} declared by content type", charset);
        return Ok(Some(charset));
    }
    if is_text_content_type(content_type) {
        return Ok(Some(guess_encoding(body)));
    }
    Ok(None)
}

/// Guesses the encoding of `bytes` by decode validation over [`PROBE_CANDIDATES`].
///
/// An empty body is UTF-8 without probing.
pub fn guess_encoding(bytes: &[u8]) -> Charset {
    if bytes.is_empty() {
        return DEFAULT_CHARSET;
    }
    let charset = probe(bytes, &PROBE_CANDIDATES);
    debug!("Guessed charset {} for {} bytes", charset, bytes.len());
    charset
}

/// Validates every candidate on its own thread.
///
/// Returns the first candidate in priority order that validates. Waiting stops
/// as soon as that candidate is known, even while lower-priority probes still
/// run. When no candidate validates, the last one is returned.
pub(crate) fn probe(bytes: &[u8], candidates: &[Charset]) -> Charset {
    let Some(&fallback) = candidates.last() else {
        return DEFAULT_CHARSET;
    };
    let shared: Arc<[u8]> = Arc::from(bytes);
    let (tx, rx) = mpsc::channel::<(usize, bool)>();

    for (index, &charset) in candidates.iter().enumerate() {
        let probe_tx = tx.clone();
        let bytes = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name(format!("charset-probe-{}", charset.name()))
            .spawn(move || {
                let matches = charset.validates(&bytes);
                trace!("Charset probe {} matches: {}", charset, matches);
                // the receiver is gone once a decision was made
                let _ = probe_tx.send((index, matches));
            });
        if spawned.is_err() {
            // no thread available: validate inline
            let _ = tx.send((index, charset.validates(&shared)));
        }
    }
    drop(tx);

    let mut results: Vec<Option<bool>> = vec![None; candidates.len()];
    while let Ok((index, matches)) = rx.recv() {
        results[index] = Some(matches);
        if let Some(charset) = decided(&results, candidates) {
            return charset;
        }
    }
    fallback
}

/// The winner, once every higher-priority candidate has reported a mismatch.
fn decided(results: &[Option<bool>], candidates: &[Charset]) -> Option<Charset> {
    for (result, &charset) in results.iter().zip(candidates) {
        match result {
            None => return None,
            Some(true) => return Some(charset),
            Some(false) => continue,
        }
    }
    None
}

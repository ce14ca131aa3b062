//! Response stream decoding and body loading.

use std::io::{self, BufRead, BufReader, Read};

use flate2::read::{DeflateDecoder, GzDecoder};
use log::debug;
use reqwest::header::HeaderMap;

use crate::config::{
    CONTENT_ENCODING, CONTENT_TYPE, DEFAULT_BUFFER_SIZE, HEADER_ACCEPT_RANGES,
    HEADER_CONTENT_RANGE, HEADER_VALUE_BYTES,
};
use crate::error_handling::RequestError;
use crate::fetch::charset::{resolve_charset, Charset};
use crate::fetch::transport::{first_header, header_values, Connection};

/// True when any value of header `name` equals `value`, ignoring ASCII case.
pub fn has_header_with_value(headers: &HeaderMap, name: &str, value: &str) -> bool {
    header_values(headers, name)
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(value))
}

/// True when the server advertises byte ranges or answered with a `Content-Range`.
pub fn is_breakpoint_available(headers: &HeaderMap) -> bool {
    has_header_with_value(headers, HEADER_ACCEPT_RANGES, HEADER_VALUE_BYTES)
        || headers.contains_key(HEADER_CONTENT_RANGE)
}

/// Wraps `stream` in a gzip or raw-deflate decoder when `Content-Encoding` asks for it.
///
/// The stream is peeked first: an empty body (HEAD, 204, 304) is passed
/// through as is, since there is nothing to decompress.
pub fn decode_stream(
    stream: Box<dyn Read + Send>,
    headers: &HeaderMap,
) -> io::Result<Box<dyn Read + Send>> {
    let gzip = has_header_with_value(headers, CONTENT_ENCODING, "gzip");
    let deflate = has_header_with_value(headers, CONTENT_ENCODING, "deflate");
    if !gzip && !deflate {
        return Ok(stream);
    }
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream);
    if reader.fill_buf()?.is_empty() {
        debug!("Empty body despite Content-Encoding, skipping decoder");
        return Ok(Box::new(reader));
    }
    if gzip {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(DeflateDecoder::new(reader)))
    }
}

/// A fully read response body.
#[derive(Debug, Clone, Default)]
pub struct LoadedBody {
    /// Raw (content-decoded) bytes
    pub bytes: Vec<u8>,
    /// Resolved charset, `None` for binary content
    pub charset: Option<Charset>,
    /// Decoded text; present only with a charset and a non-empty body
    pub text: Option<String>,
}

/// Where the final response body currently lives.
pub(crate) enum BodyState {
    /// Not read yet; the connection is held until the body is drained.
    Pending {
        stream: Box<dyn Read + Send>,
        conn: Box<dyn Connection>,
    },
    /// Handed to the caller as a raw stream.
    Handed,
    /// Read, charset resolved, connection released.
    Loaded(LoadedBody),
    /// Reading the stream failed; the connection was released.
    Failed,
}

impl BodyState {
    /// Reads the body exactly once. Later calls return the loaded body.
    pub(crate) fn load(&mut self, headers: &HeaderMap) -> Result<&LoadedBody, RequestError> {
        if let BodyState::Pending { .. } = self {
            if let BodyState::Pending { stream, mut conn } =
                std::mem::replace(self, BodyState::Failed)
            {
                let read = read_fully(stream);
                conn.disconnect();
                *self = BodyState::Loaded(LoadedBody {
                    bytes: read?,
                    ..LoadedBody::default()
                });
                if let BodyState::Loaded(body) = self {
                    let content_type = first_header(headers, CONTENT_TYPE);
                    // on an unknown charset the bytes stay readable without a text view
                    body.charset = resolve_charset(content_type.as_deref(), &body.bytes)?;
                    if let Some(charset) = body.charset.filter(|_| !body.bytes.is_empty()) {
                        body.text = Some(charset.decode(&body.bytes));
                    }
                    debug!(
                        "Loaded {} body bytes, charset {:?}",
                        body.bytes.len(),
                        body.charset.map(|c| c.name())
                    );
                }
            }
        }
        match self {
            BodyState::Loaded(body) => Ok(body),
            BodyState::Handed => Err(RequestError::InvalidState(
                "the response stream has been handed to the caller",
            )),
            BodyState::Failed => Err(RequestError::InvalidState(
                "the response body failed to load",
            )),
            BodyState::Pending { .. } => Err(RequestError::InvalidState(
                "the response body is not loaded",
            )),
        }
    }

    /// Hands the raw stream out. Fails once the body was loaded or handed out.
    pub(crate) fn take_stream(&mut self) -> Result<Box<dyn Read + Send>, RequestError> {
        match std::mem::replace(self, BodyState::Handed) {
            BodyState::Pending { stream, .. } => Ok(stream),
            previous => {
                *self = previous;
                Err(RequestError::InvalidState(
                    "the response body is no longer available as a stream",
                ))
            }
        }
    }
}

fn read_fully(stream: Box<dyn Read + Send>) -> Result<Vec<u8>, RequestError> {
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

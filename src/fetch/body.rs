//! Request body serialization.
//!
//! Form pairs are written either as `application/x-www-form-urlencoded` or as
//! `multipart/form-data`. The outgoing content type decides which.

use rand::Rng;
use url::form_urlencoded;
use url::Url;

use crate::config::{
    DEFAULT_ENCODING, FORM_URL_ENCODED, MIME_BOUNDARY_CHARS, MIME_BOUNDARY_LENGTH,
    MULTIPART_FORM_DATA,
};

/// Outcome of inspecting the caller's `Content-Type` before writing a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyEncoding {
    /// Value to send as `Content-Type`, when it differs from what the caller set
    pub content_type: Option<String>,
    /// Multipart boundary; `None` means URL-encoded
    pub boundary: Option<String>,
}

/// Decides the outgoing content type for a method that carries a body.
///
/// - No caller content type: URL-encoded with the default charset.
/// - Multipart without a boundary: a fresh random boundary is generated.
/// - Multipart with a boundary: the caller's boundary is used as is.
/// - Anything else: the caller's content type is kept, body is URL-encoded.
pub fn decide_body_encoding(caller_content_type: Option<&str>) -> BodyEncoding {
    match caller_content_type {
        None => BodyEncoding {
            content_type: Some(format!("{FORM_URL_ENCODED}; charset={DEFAULT_ENCODING}")),
            boundary: None,
        },
        Some(content_type) if content_type.contains(MULTIPART_FORM_DATA) => {
            match boundary_parameter(content_type) {
                Some(boundary) => BodyEncoding {
                    content_type: None,
                    boundary: Some(boundary),
                },
                None => {
                    let boundary = mime_boundary();
                    BodyEncoding {
                        content_type: Some(format!("{MULTIPART_FORM_DATA}; boundary={boundary}")),
                        boundary: Some(boundary),
                    }
                }
            }
        }
        Some(_) => BodyEncoding {
            content_type: None,
            boundary: None,
        },
    }
}

fn boundary_parameter(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Creates a random string suitable for use as a MIME boundary.
pub fn mime_boundary() -> String {
    let mut rng = rand::rng();
    (0..MIME_BOUNDARY_LENGTH)
        .map(|_| MIME_BOUNDARY_CHARS[rng.random_range(0..MIME_BOUNDARY_CHARS.len())] as char)
        .collect()
}

/// Serializes pairs for the request body. Empty input produces no bytes.
pub fn encode_body(pairs: &[(String, String)], boundary: Option<&str>) -> Vec<u8> {
    if pairs.is_empty() {
        return Vec::new();
    }
    match boundary {
        Some(boundary) => encode_multipart(pairs, boundary).into_bytes(),
        None => encode_url_form(pairs).into_bytes(),
    }
}

/// `name=value` pairs joined with `&`, both sides percent-encoded as UTF-8
/// (space becomes `+`).
pub fn encode_url_form(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// One `form-data` part per pair followed by the closing delimiter.
/// The closing delimiter has no trailing CRLF.
pub fn encode_multipart(pairs: &[(String, String)], boundary: &str) -> String {
    let mut out = String::new();
    for (name, value) in pairs {
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("\r\n");
        out.push_str("Content-Disposition: form-data; name=\"");
        out.push_str(&encode_mime_name(name));
        out.push_str("\"\r\n\r\n");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str("--");
    out.push_str(boundary);
    out.push_str("--");
    out
}

fn encode_mime_name(name: &str) -> String {
    name.replace('"', "%22")
}

/// Appends pairs to the URL query, keeping any query already present.
/// The fragment is dropped.
pub fn fold_into_query(url: &mut Url, pairs: &[(String, String)]) {
    url.set_fragment(None);
    url.query_pairs_mut().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_url_form_round_trip_keeps_order() {
        let original = pairs(&[("q", "a b&c"), ("lang", "中文"), ("q", "=")]);
        let encoded = encode_url_form(&original);
        assert_eq!(encoded.matches('&').count(), 2);
        let decoded: Vec<(String, String)> = form_urlencoded::parse(encoded.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_url_form_matches_form_escaping() {
        let encoded = encode_url_form(&pairs(&[("a b", "x*y~z")]));
        assert_eq!(encoded, "a+b=x*y%7Ez");
    }

    #[test]
    fn test_empty_pairs_produce_no_body() {
        assert!(encode_body(&[], None).is_empty());
        assert!(encode_body(&[], Some("boundary")).is_empty());
    }

    #[test]
    fn test_multipart_parts_and_name_escaping() {
        let body = encode_multipart(&pairs(&[("a", "1"), ("b\"c", "x\"y")]), "XyZ");
        assert_eq!(body.matches("Content-Disposition").count(), 2);
        assert!(body.contains("form-data; name=\"a\"\r\n\r\n1\r\n"));
        assert!(body.contains("name=\"b%22c\""));
        // values are written verbatim
        assert!(body.contains("\r\n\r\nx\"y\r\n"));
        assert!(body.starts_with("--XyZ\r\n"));
        assert!(body.ends_with("--XyZ--"));
    }

    #[test]
    fn test_multipart_exact_layout() {
        let body = encode_multipart(&pairs(&[("a", "1")]), "B");
        assert_eq!(
            body,
            "--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--B--"
        );
    }

    #[test]
    fn test_mime_boundary_shape() {
        let first = mime_boundary();
        let second = mime_boundary();
        assert_eq!(first.len(), MIME_BOUNDARY_LENGTH);
        assert!(first
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        assert_ne!(first, second);
    }

    #[test]
    fn test_default_content_type_is_url_encoded_utf8() {
        let decision = decide_body_encoding(None);
        assert_eq!(
            decision.content_type.as_deref(),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
        assert_eq!(decision.boundary, None);
    }

    #[test]
    fn test_multipart_without_boundary_gets_fresh_one() {
        let decision = decide_body_encoding(Some("multipart/form-data"));
        let boundary = decision.boundary.expect("boundary generated");
        assert_eq!(boundary.len(), MIME_BOUNDARY_LENGTH);
        assert_eq!(
            decision.content_type,
            Some(format!("multipart/form-data; boundary={boundary}"))
        );
    }

    #[test]
    fn test_multipart_with_caller_boundary() {
        let decision = decide_body_encoding(Some("multipart/form-data; boundary=\"abc123\""));
        assert_eq!(decision.content_type, None);
        assert_eq!(decision.boundary.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_other_caller_content_type_is_kept() {
        let decision = decide_body_encoding(Some("text/plain"));
        assert_eq!(decision, BodyEncoding { content_type: None, boundary: None });
    }

    #[test]
    fn test_fold_into_query_appends() {
        let mut url = Url::parse("http://example.com/su?x=1#frag").unwrap();
        fold_into_query(&mut url, &pairs(&[("wd", "some thing"), ("cb", "1")]));
        assert_eq!(url.as_str(), "http://example.com/su?x=1&wd=some+thing&cb=1");
    }

    #[test]
    fn test_fold_into_query_without_existing_query() {
        let mut url = Url::parse("https://example.com/").unwrap();
        fold_into_query(&mut url, &pairs(&[("a", "1")]));
        assert_eq!(url.as_str(), "https://example.com/?a=1");
    }
}

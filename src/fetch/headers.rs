//! Two-phase request header list.

use crate::config::DEFAULT_REQUEST_HEADERS;

/// Request headers with "set once per execution" semantics.
///
/// Headers configured through [`RequestHeaders::set`] stay pending until the
/// next execution merges them after the defaults. The merge consumes the
/// pending list, so a later execution that was not reconfigured sends the
/// defaults only.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    pending: Option<Vec<(String, String)>>,
}

impl RequestHeaders {
    /// Replaces the caller headers for the next execution.
    pub fn set(&mut self, headers: Vec<(String, String)>) {
        self.pending = Some(headers);
    }

    /// True when caller headers are waiting for the next execution.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Merges defaults and pending caller headers into the list one execution sends.
    ///
    /// Defaults come first; a caller header with the same name replaces the
    /// default when applied to the connection.
    pub fn finalize(&mut self) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = DEFAULT_REQUEST_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        if let Some(pending) = self.pending.take() {
            merged.extend(pending);
        }
        merged
    }
}

/// Parses a `Name: value` header line.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

//! Form data builder.

use std::fmt::Display;

/// Ordered `(name, value)` pairs sent with a request.
///
/// Passed by value into `execute`: bodyless methods fold the pairs into the
/// URL query, methods with a body write them as the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Any `Display` value is converted to its string form.
    pub fn data(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.pairs.push((name.into(), value.to_string()));
        self
    }

    /// Appends a field in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Display) {
        self.pairs.push((name.into(), value.to_string()));
    }

    /// The fields in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no field was added.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (name, value) in iter {
            form.push(name, value);
        }
        form
    }
}

/// Shorthand for `FormData::new().data(name, value)`.
pub fn form_data(name: impl Into<String>, value: impl Display) -> FormData {
    FormData::new().data(name, value)
}

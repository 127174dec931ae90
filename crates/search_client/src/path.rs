use std::fmt;

use percent_encoding::{
    AsciiSet,
    NON_ALPHANUMERIC,
    utf8_percent_encode,
};

/// Characters `encodeURIComponent` leaves alone: ASCII alphanumerics and `-_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The location of a request relative to the service origin.
///
/// Literal segments are joined with `/` and query parameters are rendered after a single `?`,
/// each kind keeping the order it was added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
    params: Vec<(String, String)>,
}

/// Extra path segments and query parameters forwarded verbatim by
/// [`search`](crate::SearchClient::search) and [`suggest`](crate::SearchClient::suggest).
pub type Query = RequestPath;

impl RequestPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Appends the segments of `other` after ours and its parameters after ours.
    pub fn extend(mut self, other: &RequestPath) -> Self {
        self.segments.extend(other.segments.iter().cloned());
        self.params.extend(other.params.iter().cloned());
        self
    }

    pub fn literal_segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.params.is_empty()
    }

    /// `/` joined segments, without a leading slash.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// `&` joined `key=value` pairs. Values are percent encoded, keys are not.
    pub fn query(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, COMPONENT)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Renders `/segment/segment?key=value&key=value`.
    pub fn to_path_and_query(&self) -> String {
        format!("/{}?{}", self.path(), self.query())
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_and_query())
    }
}

//! HTTP response under construction.

use crate::http::header::{Header, HeaderGroup};
use crate::http::status::StatusCode;

/// A response as produced by handlers and the server, before serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<Header>,
    pub body: Option<Vec<u8>>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a `200 OK` response.
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok)
    }

    /// Append a header.
    pub fn with_header(
        mut self,
        group: HeaderGroup,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push(Header::new(group, name, value));
        self
    }

    /// Append a `Content-Type` representation header.
    pub fn with_content_type(self, value: impl Into<String>) -> Self {
        self.with_header(HeaderGroup::Representation, "Content-Type", value)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.is(name))
            .map(|header| header.value.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|header| header.is(name))
    }

    /// Append `header` unless one with the same name is already present.
    ///
    /// Returns whether the header was added.
    pub fn add_if_absent(&mut self, header: Header) -> bool {
        if self.has_header(&header.name) {
            return false;
        }
        self.headers.push(header);
        true
    }

    /// Replace every header named like `header` with `header`.
    pub fn set_header(&mut self, header: Header) {
        self.headers.retain(|existing| !existing.is(&header.name));
        self.headers.push(header);
    }

    /// Body length in bytes; an absent body counts as empty.
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Mandated headers for this status that the response lacks.
    pub fn missing_mandated_headers(&self) -> Vec<&'static str> {
        self.status
            .mandated_headers()
            .iter()
            .copied()
            .filter(|name| !self.has_header(name))
            .collect()
    }
}

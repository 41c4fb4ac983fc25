//! Parsed HTTP request.

use crate::http::header::Header;
use crate::http::method::Method;
use bytes::Bytes;

/// A `name=value` pair from the request target's query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

/// An HTTP request, immutable once parsed.
#[derive(Debug, Clone)]
pub struct Request {
    raw: Bytes,
    method: Method,
    target: String,
    query: Vec<QueryParam>,
    version: String,
    headers: Vec<Header>,
    body: Option<Bytes>,
}

impl Request {
    pub(crate) fn new(
        raw: Bytes,
        method: Method,
        target: String,
        query: Vec<QueryParam>,
        version: String,
        headers: Vec<Header>,
        body: Option<Bytes>,
    ) -> Self {
        Self {
            raw,
            method,
            target,
            query,
            version,
            headers,
            body,
        }
    }

    /// The bytes the request was parsed from.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path part of the request target, without the query string.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn query(&self) -> &[QueryParam] {
        &self.query
    }

    /// First query value for `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value.as_str())
    }

    /// Protocol version, e.g. `1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.is(name))
            .map(|header| header.value.as_str())
    }

    /// Every header with the given name.
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.iter().filter(move |header| header.is(name))
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// `METHOD target HTTP/version`, for logs.
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.target, self.version)
    }
}

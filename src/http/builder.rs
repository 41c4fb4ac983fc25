//! HTTP response serialisation.
//!
//! ```text
//! HTTP/<version> <code> <reason>\r\nName: value...[\r\n\r\n<body>]
//! ```
//!
//! Headers are emitted grouped (Request, Response, Representation, Payload),
//! insertion order kept within a group. No header is added here.

use crate::http::catalog::StatusCatalog;
use crate::http::request::Request;
use crate::http::response::Response;
use bytes::{BufMut, Bytes, BytesMut};

/// Protocol versions the server speaks, lowest first.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["1.0", "1.1"];

/// Whether `version` is one the server speaks.
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

/// Version to render: the request's when supported, else the highest supported.
pub fn response_version(request: Option<&Request>) -> &str {
    match request {
        Some(request) if is_supported_version(request.version()) => request.version(),
        _ => SUPPORTED_VERSIONS[SUPPORTED_VERSIONS.len() - 1],
    }
}

/// Serialise `response`, answering `request` when there is one.
pub fn build(request: Option<&Request>, response: &Response, catalog: &StatusCatalog) -> Bytes {
    let version = response_version(request);
    let reason = catalog.reason(response.status);

    let mut out = BytesMut::with_capacity(64 + response.body_len());
    out.put_slice(b"HTTP/");
    out.put_slice(version.as_bytes());
    out.put_u8(b' ');
    out.put_slice(response.status.as_u16().to_string().as_bytes());
    out.put_u8(b' ');
    out.put_slice(reason.as_bytes());

    let mut headers: Vec<_> = response.headers.iter().collect();
    // stable: keeps insertion order within a group
    headers.sort_by_key(|header| header.group);

    for header in headers {
        out.put_slice(b"\r\n");
        out.put_slice(header.name.as_bytes());
        out.put_slice(b": ");
        out.put_slice(header.value.as_bytes());
    }

    if let Some(body) = response.body.as_deref().filter(|body| !body.is_empty()) {
        out.put_slice(b"\r\n\r\n");
        out.put_slice(body);
    }

    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::header::{HeaderGroup, HeaderGroups};
    use crate::http::parser;
    use crate::http::status::StatusCode;

    fn request(version: &str) -> Request {
        let raw = format!("GET / HTTP/{version}");
        parser::parse(Bytes::from(raw), &HeaderGroups::standard()).unwrap()
    }

    #[test]
    fn test_single_line_response() {
        let out = build(
            Some(&request("1.0")),
            &Response::ok(),
            &StatusCatalog::english(),
        );
        assert_eq!(&out[..], b"HTTP/1.0 200 OK");
    }

    #[test]
    fn test_response_with_header() {
        let response = Response::ok().with_header(HeaderGroup::Response, "Header", "value");
        let out = build(Some(&request("1.0")), &response, &StatusCatalog::english());
        assert_eq!(&out[..], b"HTTP/1.0 200 OK\r\nHeader: value");
    }

    #[test]
    fn test_round_trip_header_and_body() {
        let raw = Bytes::from_static(b"GET /?q=1 HTTP/1.0\r\nHeader: v\r\n\r\nBody");
        let request = parser::parse(raw, &HeaderGroups::standard()).unwrap();

        let header = request.headers()[0].clone();
        let mut response = Response::ok().with_body("Body");
        response.headers.push(header);

        let out = build(Some(&request), &response, &StatusCatalog::english());
        assert_eq!(&out[..], b"HTTP/1.0 200 OK\r\nHeader: v\r\n\r\nBody");
    }

    #[test]
    fn test_headers_ordered_by_group_then_insertion() {
        let response = Response::ok()
            .with_header(HeaderGroup::Payload, "Content-Length", "0")
            .with_header(HeaderGroup::Response, "Server", "s")
            .with_header(HeaderGroup::Representation, "Content-Type", "text/plain")
            .with_header(HeaderGroup::Response, "Date", "d")
            .with_header(HeaderGroup::Request, "X-Echo", "e");
        let out = build(None, &response, &StatusCatalog::english());
        assert_eq!(
            &out[..],
            &b"HTTP/1.1 200 OK\r\nX-Echo: e\r\nServer: s\r\nDate: d\r\nContent-Type: text/plain\r\nContent-Length: 0"[..]
        );
    }

    #[test]
    fn test_version_selection() {
        assert_eq!(response_version(Some(&request("1.1"))), "1.1");
        assert_eq!(response_version(Some(&request("2.0"))), "1.1");
        assert_eq!(response_version(None), "1.1");
    }

    #[test]
    fn test_empty_body_is_omitted() {
        let response = Response::new(StatusCode::NoContent).with_body(Vec::new());
        let out = build(None, &response, &StatusCatalog::english());
        assert_eq!(&out[..], b"HTTP/1.1 204 No Content");
    }

    #[test]
    fn test_reason_falls_back_to_identifier() {
        let out = build(None, &Response::new(StatusCode::NotFound), &StatusCatalog::empty());
        assert_eq!(&out[..], b"HTTP/1.1 404 NotFound");
    }
}

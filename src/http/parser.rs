//! HTTP request parser.
//!
//! Decodes a single frame into a [`Request`]:
//!
//! ```text
//! METHOD SP TARGET[?name=value&...] SP HTTP/VERSION
//! Parameter: Value
//! ...
//! <blank line>
//! body bytes, verbatim
//! ```
//!
//! Text is decoded as UTF-8 (lossily) line by line; the body is never decoded.
//! Lines may end in `\r\n`, `\n` or `\r`.

use crate::http::header::{Header, HeaderGroups};
use crate::http::method::Method;
use crate::http::request::{QueryParam, Request};
use bytes::Bytes;
use std::borrow::Cow;

/// The frame is not a well-formed HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError;

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed request")
    }
}

impl std::error::Error for ParseError {}

/// Parse a request frame.
pub fn parse(input: Bytes, groups: &HeaderGroups) -> Result<Request, ParseError> {
    let (start_line, mut pos) = next_line(&input, 0).ok_or(ParseError)?;
    let (method, target, query, version) = parse_start_line(&decode(start_line))?;

    let mut headers = Vec::new();
    let mut body = None;

    while let Some((line, next)) = next_line(&input, pos) {
        pos = next;

        if line.is_empty() {
            if pos < input.len() {
                body = Some(input.slice(pos..));
            }
            break;
        }

        let (name, value) = parse_header(&decode(line))?;
        headers.push(Header::new(groups.group_of(&name), name, value));
    }

    Ok(Request::new(
        input, method, target, query, version, headers, body,
    ))
}

/// Return the line starting at `pos` (terminator excluded) and the offset of
/// the following line, or `None` once the input is exhausted.
fn next_line(input: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    if pos >= input.len() {
        return None;
    }

    let rest = &input[pos..];
    match rest.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(end) => {
            let terminator = if rest[end] == b'\r' && rest.get(end + 1) == Some(&b'\n') {
                2
            } else {
                1
            };
            Some((&rest[..end], pos + end + terminator))
        }
        None => Some((rest, input.len())),
    }
}

fn decode(line: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(line)
}

fn parse_start_line(
    line: &str,
) -> Result<(Method, String, Vec<QueryParam>, String), ParseError> {
    let (method, rest) = line.split_once(char::is_whitespace).ok_or(ParseError)?;
    if method.is_empty() || !method.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ParseError);
    }

    let (target, version) = rest.rsplit_once("HTTP/").ok_or(ParseError)?;
    let target = strip_one_whitespace_suffix(target).ok_or(ParseError)?;
    if target.is_empty() || !is_version(version) {
        return Err(ParseError);
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, parse_query(query)?),
        None => (target, Vec::new()),
    };

    Ok((
        Method::from_token(method),
        path.to_string(),
        query,
        version.to_string(),
    ))
}

fn strip_one_whitespace_suffix(s: &str) -> Option<&str> {
    let last = s.chars().next_back()?;
    last.is_whitespace().then(|| &s[..s.len() - last.len_utf8()])
}

/// `digit ( "." digit )*`
fn is_version(version: &str) -> bool {
    let mut parts = version.split('.');
    parts.all(|part| part.len() == 1 && part.chars().all(|c| c.is_ascii_digit()))
}

fn parse_query(query: &str) -> Result<Vec<QueryParam>, ParseError> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok(QueryParam {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => Err(ParseError),
        })
        .collect()
}

fn parse_header(line: &str) -> Result<(String, String), ParseError> {
    let (name, rest) = line.split_once(':').ok_or(ParseError)?;
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => {}
        _ => return Err(ParseError),
    }
    let value = chars.as_str();

    if name.is_empty() || value.is_empty() {
        return Err(ParseError);
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::header::HeaderGroup;

    fn parse_str(input: &str) -> Result<Request, ParseError> {
        parse(Bytes::copy_from_slice(input.as_bytes()), &HeaderGroups::standard())
    }

    #[test]
    fn test_parse_full_request() {
        let request = parse_str("GET /?q=1 HTTP/1.0\r\nHeader: v\r\n\r\nBody").unwrap();
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.target(), "/");
        assert_eq!(
            request.query(),
            &[QueryParam {
                name: "q".to_string(),
                value: "1".to_string()
            }]
        );
        assert_eq!(request.version(), "1.0");
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.headers()[0].name, "Header");
        assert_eq!(request.headers()[0].value, "v");
        assert_eq!(request.headers()[0].group, HeaderGroup::Request);
        assert_eq!(request.body().map(|b| &b[..]), Some(&b"Body"[..]));
    }

    #[test]
    fn test_valid_request_shapes() {
        for input in [
            "GET / HTTP/1.0",
            "GET /?parameter=value HTTP/1.0",
            "GET / HTTP/1.0\r\nHeader: value",
            "GET /?parameter=value HTTP/1.0\r\nHeader: value",
            "GET / HTTP/1.0\r\n\r\nBody",
            "GET /?parameter=value HTTP/1.0\r\n\r\nBody",
            "GET / HTTP/1.0\r\nHeader: value\r\n\r\nBody",
            "GET /?parameter=value HTTP/1.0\r\nHeader: value\r\n\r\nBody",
            "GET / HTTP/1.1\nHost: localhost\n\n",
        ] {
            assert!(parse_str(input).is_ok(), "rejected: {input:?}");
        }
    }

    #[test]
    fn test_malformed_start_lines() {
        for input in [
            "",
            "GET",
            "GET /",
            "GET / HTTP/",
            "GET / HTTP/x.y",
            "GET / HTTP/10",
            "/ HTTP/1.0",
            " / HTTP/1.0",
            "GET HTTP/1.0",
            "GET /HTTP/1.0",
            "GET / FTP/1.0",
            "G-T / HTTP/1.0",
            "\r\nGET / HTTP/1.0",
        ] {
            assert_eq!(parse_str(input).err(), Some(ParseError), "accepted: {input:?}");
        }
    }

    #[test]
    fn test_unknown_method_is_not_a_parse_failure() {
        let request = parse_str("BREW /pot HTTP/1.1").unwrap();
        assert_eq!(request.method(), Method::NotImplemented);
        assert_eq!(request.target(), "/pot");
    }

    #[test]
    fn test_query_without_equals_fails() {
        assert!(parse_str("GET /?parameter HTTP/1.0").is_err());
        assert!(parse_str("GET /?=value HTTP/1.0").is_err());
        assert!(parse_str("GET /?a=1&b HTTP/1.0").is_err());
    }

    #[test]
    fn test_query_multiple_and_empty_segments() {
        let request = parse_str("GET /search?a=1&&b=2& HTTP/1.1").unwrap();
        assert_eq!(request.target(), "/search");
        assert_eq!(request.query().len(), 2);
        assert_eq!(request.query_value("b"), Some("2"));
    }

    #[test]
    fn test_malformed_header_fails() {
        assert!(parse_str("GET / HTTP/1.0\r\nHeader").is_err());
        assert!(parse_str("GET / HTTP/1.0\r\nHeader:value").is_err());
        assert!(parse_str("GET / HTTP/1.0\r\nHeader: ").is_err());
        assert!(parse_str("GET / HTTP/1.0\r\n: value").is_err());
    }

    #[test]
    fn test_header_value_may_contain_colon() {
        let request = parse_str("GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n").unwrap();
        assert_eq!(request.header("host"), Some("localhost:8080"));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_header_groups_from_table() {
        let request = parse_str("POST / HTTP/1.0\r\nContent-Length: 4\r\nContent-Type: text/plain\r\n\r\nabcd").unwrap();
        assert_eq!(request.headers()[0].group, HeaderGroup::Payload);
        assert_eq!(request.headers()[1].group, HeaderGroup::Representation);
    }

    #[test]
    fn test_body_is_verbatim() {
        let input = b"POST /upload HTTP/1.0\r\n\r\n\xff\x00\r\nline\r\n".to_vec();
        let request = parse(Bytes::from(input), &HeaderGroups::empty()).unwrap();
        assert_eq!(
            request.body().map(|b| &b[..]),
            Some(&b"\xff\x00\r\nline\r\n"[..])
        );
        assert_eq!(request.raw().len(), 35);
    }
}

//! Canned responses (400, 404, 405, 500, 501, 505, ...) with an HTML body.
//!
//! Every generated response carries the server's default headers, a
//! `Content-Type` and an exact `Content-Length`, plus whatever headers the
//! status mandates. A status whose mandated headers are not supplied is
//! refused with [`StandardResponseError`] instead of being sent.

use crate::http::catalog::StatusCatalog;
use crate::http::header::{Header, HeaderGroup};
use crate::http::response::Response;
use crate::http::status::StatusCode;
use chrono::Utc;
use std::sync::Arc;

/// A standard response could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardResponseError {
    /// The status mandates headers that were not supplied.
    MissingHeaders {
        status: StatusCode,
        headers: Vec<&'static str>,
    },
}

impl std::fmt::Display for StandardResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StandardResponseError::MissingHeaders { status, headers } => write!(
                f,
                "{} response requires headers: {}",
                status.as_u16(),
                headers.join(", ")
            ),
        }
    }
}

impl std::error::Error for StandardResponseError {}

/// `Date` header value in RFC 1123 format.
pub fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Headers the server attaches to every response: `Server` and `Date`.
pub fn default_headers(server_name: &str) -> [Header; 2] {
    [
        Header::new(HeaderGroup::Response, "Server", server_name),
        Header::new(HeaderGroup::Response, "Date", http_date()),
    ]
}

pub(crate) fn content_length(len: usize) -> Header {
    Header::new(HeaderGroup::Payload, "Content-Length", len.to_string())
}

/// Generator for standard responses. Cheap to clone; share it with handlers.
#[derive(Debug, Clone)]
pub struct StandardResponses {
    server_name: Arc<str>,
    catalog: Arc<StatusCatalog>,
}

impl StandardResponses {
    pub fn new(server_name: impl Into<Arc<str>>, catalog: Arc<StatusCatalog>) -> Self {
        Self {
            server_name: server_name.into(),
            catalog,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    /// Build the standard response for `status`.
    ///
    /// `required` headers are attached unless the generator already set a
    /// header of the same name.
    pub fn generate(
        &self,
        status: StatusCode,
        required: impl IntoIterator<Item = Header>,
    ) -> Result<Response, StandardResponseError> {
        let page = self.render_page(status);

        let mut response = Response::new(status);
        response.headers.extend(default_headers(&self.server_name));
        response.headers.push(Header::new(
            HeaderGroup::Representation,
            "Content-Type",
            "text/html; charset=utf-8",
        ));
        response.headers.push(content_length(page.len()));
        response.body = Some(page.into_bytes());

        for header in required {
            response.add_if_absent(header);
        }

        let missing = response.missing_mandated_headers();
        if !missing.is_empty() {
            return Err(StandardResponseError::MissingHeaders {
                status,
                headers: missing,
            });
        }

        Ok(response)
    }

    fn render_page(&self, status: StatusCode) -> String {
        let status_code_message = format!("{} {}", status.as_u16(), self.catalog.reason(status));

        self.catalog
            .page_template()
            .replace("%language%", self.catalog.language())
            .replace("%status-code-message%", &status_code_message)
            .replace("%details%", self.catalog.details(status))
            .replace("%server-name%", &self.server_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> StandardResponses {
        StandardResponses::new("Test Server", Arc::new(StatusCatalog::english()))
    }

    #[test]
    fn test_not_found_page() {
        let response = generator().generate(StatusCode::NotFound, []).unwrap();
        let body = String::from_utf8(response.body.clone().unwrap()).unwrap();

        assert!(body.contains("<title>404 Not Found</title>"));
        assert!(body.contains("Test Server"));
        assert!(body.contains("lang=\"en\""));
        assert_eq!(response.header("Server"), Some("Test Server"));
        assert!(response.has_header("Date"));
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(
            response.header("Content-Length"),
            Some(body.len().to_string().as_str())
        );
    }

    #[test]
    fn test_method_not_allowed_requires_allow() {
        let err = generator()
            .generate(StatusCode::MethodNotAllowed, [])
            .unwrap_err();
        assert_eq!(
            err,
            StandardResponseError::MissingHeaders {
                status: StatusCode::MethodNotAllowed,
                headers: vec!["Allow"],
            }
        );
        assert_eq!(err.to_string(), "405 response requires headers: Allow");

        let response = generator()
            .generate(
                StatusCode::MethodNotAllowed,
                [Header::new(HeaderGroup::Response, "Allow", "GET")],
            )
            .unwrap();
        assert_eq!(response.header("Allow"), Some("GET"));
    }

    #[test]
    fn test_required_headers_do_not_override_generated() {
        let response = generator()
            .generate(
                StatusCode::ServiceUnavailable,
                [
                    Header::new(HeaderGroup::Response, "Retry-After", "120"),
                    Header::new(HeaderGroup::Payload, "Content-Length", "1"),
                ],
            )
            .unwrap();
        assert_eq!(response.header("Retry-After"), Some("120"));
        assert_eq!(
            response.header("Content-Length"),
            Some(response.body_len().to_string().as_str())
        );
    }

    #[test]
    fn test_custom_catalog_page() {
        let catalog = StatusCatalog::empty()
            .with_reason(StatusCode::NotFound, "Nicht gefunden")
            .with_details(StatusCode::NotFound, "Nichts hier")
            .with_page_template("%language%|%status-code-message%|%details%|%server-name%", "de");
        let responses = StandardResponses::new("Test Server", Arc::new(catalog));

        let response = responses.generate(StatusCode::NotFound, []).unwrap();
        assert_eq!(
            response.body.as_deref(),
            Some(&b"de|404 Nicht gefunden|Nichts hier|Test Server"[..])
        );
    }

    #[test]
    fn test_http_date_format() {
        let date = http_date();
        assert!(date.ends_with(" GMT"));
        assert!(chrono::DateTime::parse_from_rfc2822(&date.replace("GMT", "+0000")).is_ok());
    }
}

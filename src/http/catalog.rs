//! Status reason phrases, error-page details and the error-page template.
//!
//! This is lookup data handed to the server at construction; nothing here is
//! consulted through globals.

use crate::http::status::StatusCode;
use std::collections::HashMap;

/// Error page used by the standard response generator.
///
/// Placeholders: `%language%`, `%status-code-message%`, `%details%`,
/// `%server-name%`.
pub const DEFAULT_PAGE_TEMPLATE: &str = "<!DOCTYPE html>

<html lang=\"%language%\">

<head>
    <meta charset=\"utf-8\">
    <meta name=\"viewport\" content=\"width=device-width\">
    <style>
        body {
            text-align: center;
        }
    </style>
    <title>%status-code-message%</title>
</head>

<body>
    <h1>%status-code-message%</h1>
    <p>%details%</p>
    <hr>
    <p>%server-name%</p>
</body>

</html>";

const REASON_PHRASES: &[(u16, &str)] = &[
    (100, "Continue"),
    (101, "Switching Protocols"),
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Content Too Large"),
    (414, "URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (421, "Misdirected Request"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (510, "Not Extended"),
    (511, "Network Authentication Required"),
];

const DETAILS: &[(u16, &str)] = &[
    (400, "Your client sent an illegal request"),
    (
        401,
        "You don't have permission to access this resource using the credentials you provided",
    ),
    (403, "You don't have permission to access this resource"),
    (404, "The requested resource was not found on this server"),
    (405, "The requested method is not allowed for this resource"),
    (
        500,
        "The server encountered an internal error and was unable to complete your request",
    ),
    (501, "The server does not support the functionality required to fulfill the request"),
    (
        503,
        "The server is temporarily unable to service your request, please try again later",
    ),
    (505, "The server does not support the HTTP version used in the request"),
];

/// Read-only status → reason phrase / details lookup.
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    reasons: HashMap<StatusCode, String>,
    details: HashMap<StatusCode, String>,
    page_template: String,
    language: String,
}

impl StatusCatalog {
    /// A catalog with no texts at all; every lookup falls back.
    pub fn empty() -> Self {
        Self {
            reasons: HashMap::new(),
            details: HashMap::new(),
            page_template: DEFAULT_PAGE_TEMPLATE.to_string(),
            language: "en".to_string(),
        }
    }

    /// English reason phrases and error-page details.
    pub fn english() -> Self {
        let mut catalog = Self::empty();
        for &(code, reason) in REASON_PHRASES {
            if let Some(status) = StatusCode::from_u16(code) {
                catalog.reasons.insert(status, reason.to_string());
            }
        }
        for &(code, details) in DETAILS {
            if let Some(status) = StatusCode::from_u16(code) {
                catalog.details.insert(status, details.to_string());
            }
        }
        catalog
    }

    pub fn with_reason(mut self, status: StatusCode, reason: impl Into<String>) -> Self {
        self.reasons.insert(status, reason.into());
        self
    }

    pub fn with_details(mut self, status: StatusCode, details: impl Into<String>) -> Self {
        self.details.insert(status, details.into());
        self
    }

    pub fn with_page_template(mut self, template: impl Into<String>, language: impl Into<String>) -> Self {
        self.page_template = template.into();
        self.language = language.into();
        self
    }

    /// Reason phrase for the status line, falling back to the status identifier.
    pub fn reason(&self, status: StatusCode) -> &str {
        self.reasons
            .get(&status)
            .map(String::as_str)
            .unwrap_or_else(|| status.identifier())
    }

    /// Error-page details, falling back to the reason phrase.
    pub fn details(&self, status: StatusCode) -> &str {
        self.details
            .get(&status)
            .map(String::as_str)
            .unwrap_or_else(|| self.reason(status))
    }

    pub fn page_template(&self) -> &str {
        &self.page_template
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::english()
    }
}

//! Request routing: turns one frame into one HTTP response.
//!
//! Order of checks:
//! 1. the frame must parse, else `400`
//! 2. the version must be supported, else `505`
//! 3. the method must be known, else `501`
//! 4. HTTP/1.1 requests need exactly one `Host` and one valid `Connection`
//!    header, else `400`
//! 5. `OPTIONS *` lists every registered method
//! 6. `TRACE` echoes the request when enabled, else `501`
//! 7. unknown target `404`, unregistered method `405`, otherwise the handler
//!
//! Every response except generated ones is given the default headers (unless
//! the handler set them) and an exact `Content-Length` before it is
//! serialised.

use crate::events::{EventBus, ServerEvent};
use crate::http::builder;
use crate::http::endpoint::Endpoints;
use crate::http::header::{Header, HeaderGroup, HeaderGroups};
use crate::http::method::{allow_value, Method};
use crate::http::parser;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::standard::{content_length, default_headers, StandardResponses};
use crate::http::status::StatusCode;
use crate::transport::{Frame, FrameHandler, Reply};
use bytes::Bytes;
use tracing::{debug, error, info, warn};

const KEEP_ALIVE: &str = "keep-alive";
const CLOSE: &str = "close";

/// Frozen routing state shared by every connection task.
pub(crate) struct Router {
    endpoints: Endpoints,
    header_groups: HeaderGroups,
    responses: StandardResponses,
    trace_enabled: bool,
    events: EventBus,
}

impl Router {
    pub fn new(
        endpoints: Endpoints,
        header_groups: HeaderGroups,
        responses: StandardResponses,
        trace_enabled: bool,
        events: EventBus,
    ) -> Self {
        Self {
            endpoints,
            header_groups,
            responses,
            trace_enabled,
            events,
        }
    }

    /// Answer one frame.
    pub fn reply(&self, frame: &Frame) -> Reply {
        let (request, mut response) = self.respond(frame.bytes.clone());
        let keep_alive = decide_keep_alive(request.as_ref(), &mut response);
        let bytes = builder::build(request.as_ref(), &response, self.responses.catalog());

        let request_line = request.as_ref().map(Request::request_line);
        info!(
            connection = %frame.connection.id,
            request = request_line.as_deref().unwrap_or("<malformed>"),
            status = response.status.as_u16(),
            keep_alive,
            "Request handled"
        );
        self.events.emit(ServerEvent::RequestHandled {
            connection: frame.connection.id,
            request_line,
            status: response.status,
        });

        Reply { bytes, keep_alive }
    }

    /// Route raw bytes to a response, keeping the parsed request if any.
    fn respond(&self, raw: Bytes) -> (Option<Request>, Response) {
        let request = match parser::parse(raw, &self.header_groups) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Rejecting request");
                return (None, self.standard(StatusCode::BadRequest, None));
            }
        };

        let response = match self.reject(&request) {
            Some(status) => self.standard(status, None),
            None => self.dispatch(&request),
        };
        (Some(request), response)
    }

    /// Protocol-level checks that do not depend on the endpoints.
    fn reject(&self, request: &Request) -> Option<StatusCode> {
        if !builder::is_supported_version(request.version()) {
            return Some(StatusCode::HttpVersionNotSupported);
        }
        if request.method() == Method::NotImplemented {
            return Some(StatusCode::NotImplemented);
        }
        if request.version() == "1.1" && !has_http11_headers(request) {
            return Some(StatusCode::BadRequest);
        }
        None
    }

    fn dispatch(&self, request: &Request) -> Response {
        let method = request.method();

        if method == Method::Options && request.target() == "*" {
            let allow = allow_value(self.endpoints.all_methods());
            return self.supplement(Response::ok().with_header(HeaderGroup::Response, "Allow", allow));
        }

        if method == Method::Trace {
            if !self.trace_enabled {
                return self.standard(StatusCode::NotImplemented, None);
            }
            let echo = Response::ok()
                .with_content_type("message/http")
                .with_body(request.raw().to_vec());
            return self.supplement(echo);
        }

        let Some(endpoint) = self.endpoints.get(request.target()) else {
            return self.standard(StatusCode::NotFound, None);
        };

        let Some(handler) = endpoint.handler(method) else {
            let allow = Header::new(HeaderGroup::Response, "Allow", allow_value(endpoint.methods()));
            return self.standard(StatusCode::MethodNotAllowed, Some(allow));
        };

        let Some(response) = handler(request) else {
            warn!(request = %request.request_line(), "Handler produced no response");
            return self.standard(StatusCode::InternalServerError, None);
        };

        let missing = response.missing_mandated_headers();
        if !missing.is_empty() {
            error!(
                request = %request.request_line(),
                status = response.status.as_u16(),
                missing = %missing.join(", "),
                "Handler response lacks mandatory headers"
            );
            return self.standard(StatusCode::InternalServerError, None);
        }

        self.supplement(response)
    }

    /// Add the default headers unless present. `Content-Length` always
    /// reflects the actual body.
    fn supplement(&self, mut response: Response) -> Response {
        for header in default_headers(self.responses.server_name()) {
            response.add_if_absent(header);
        }
        response.set_header(content_length(response.body_len()));
        response
    }

    fn standard(&self, status: StatusCode, required: Option<Header>) -> Response {
        match self.responses.generate(status, required) {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Failed to generate standard response");
                let mut response = Response::new(StatusCode::InternalServerError);
                response
                    .headers
                    .extend(default_headers(self.responses.server_name()));
                response.headers.push(content_length(0));
                response
            }
        }
    }
}

impl FrameHandler for Router {
    fn handle(&self, frame: &Frame) -> Option<Reply> {
        Some(self.reply(frame))
    }
}

/// Exactly one `Host` and exactly one `Connection` whose value is
/// `keep-alive` or `close`.
fn has_http11_headers(request: &Request) -> bool {
    if request.headers_named("Host").count() != 1 {
        return false;
    }
    let mut connection = request.headers_named("Connection");
    match (connection.next(), connection.next()) {
        (Some(header), None) => header.value == KEEP_ALIVE || header.value == CLOSE,
        _ => false,
    }
}

/// Whether to keep the connection open after `response`.
///
/// A `Connection` header set by the handler wins. Otherwise the request's
/// `Connection` value is mirrored into the response. Without either, close.
fn decide_keep_alive(request: Option<&Request>, response: &mut Response) -> bool {
    if let Some(value) = response.header("Connection") {
        return value == KEEP_ALIVE;
    }

    let Some(requested) = request.and_then(|r| r.header("Connection")) else {
        return false;
    };

    let keep_alive = requested == KEEP_ALIVE;
    response.headers.push(Header::new(
        HeaderGroup::Response,
        "Connection",
        if keep_alive { KEEP_ALIVE } else { CLOSE },
    ));
    keep_alive
}

//! HTTP/1.0 and HTTP/1.1 on top of the TCP transport.

pub mod builder;
pub mod catalog;
pub mod endpoint;
pub mod header;
pub mod method;
pub mod parser;
pub mod request;
pub mod response;
mod router;
mod server;
pub mod standard;
pub mod status;

pub use catalog::StatusCatalog;
pub use endpoint::{Handler, RegistrationError};
pub use header::{Header, HeaderGroup, HeaderGroups};
pub use method::Method;
pub use request::{QueryParam, Request};
pub use response::Response;
pub use server::{HttpOptions, HttpServer};
pub use standard::{StandardResponseError, StandardResponses};
pub use status::StatusCode;

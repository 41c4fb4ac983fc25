//! HTTP response status codes.
//!
//! The set is closed: a response can only carry a status listed here, so an
//! unrecognised code is unrepresentable rather than a runtime client error.

use std::fmt;

macro_rules! status_codes {
    ($($variant:ident = $code:literal,)+) => {
        /// Response status recognised by the server.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum StatusCode {
            $($variant = $code,)+
        }

        impl StatusCode {
            /// Every recognised status, ascending by code.
            pub const ALL: &'static [StatusCode] = &[$(StatusCode::$variant,)+];

            /// Status identifier, used as reason phrase when no text is known.
            pub fn identifier(&self) -> &'static str {
                match self {
                    $(StatusCode::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

status_codes! {
    Continue = 100,
    SwitchingProtocols = 101,
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,
    MultipleChoices = 300,
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    TemporaryRedirect = 307,
    PermanentRedirect = 308,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    ProxyAuthenticationRequired = 407,
    RequestTimeout = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    ContentTooLarge = 413,
    UriTooLong = 414,
    UnsupportedMediaType = 415,
    RangeNotSatisfiable = 416,
    ExpectationFailed = 417,
    MisdirectedRequest = 421,
    UpgradeRequired = 426,
    PreconditionRequired = 428,
    TooManyRequests = 429,
    RequestHeaderFieldsTooLarge = 431,
    UnavailableForLegalReasons = 451,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
    HttpVersionNotSupported = 505,
    VariantAlsoNegotiates = 506,
    NotExtended = 510,
    NetworkAuthenticationRequired = 511,
}

impl StatusCode {
    /// Numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Look up a recognised status by its numeric code.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.as_u16() == code)
    }

    /// Headers a response with this status must carry.
    pub fn mandated_headers(&self) -> &'static [&'static str] {
        match self {
            StatusCode::Unauthorized => &["WWW-Authenticate"],
            StatusCode::MethodNotAllowed => &["Allow"],
            StatusCode::ProxyAuthenticationRequired => &["Proxy-Authenticate"],
            StatusCode::RequestTimeout => &["Connection"],
            StatusCode::RangeNotSatisfiable => &["Content-Range"],
            StatusCode::UpgradeRequired => &["Upgrade", "Connection"],
            StatusCode::ServiceUnavailable => &["Retry-After"],
            _ => &[],
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.identifier())
    }
}

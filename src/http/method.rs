//! HTTP request methods.

use std::fmt;
use std::str::FromStr;

/// Request method recognised by the server.
///
/// Declaration order is the canonical sort order used when the server lists
/// methods in an `Allow` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
    Options,
    Trace,
    /// Any method token outside the known verb set.
    NotImplemented,
}

impl Method {
    /// Every method a request can name, in canonical order.
    pub const KNOWN: [Method; 9] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
    ];

    /// Wire representation of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::NotImplemented => "NOTIMPLEMENTED",
        }
    }

    /// Resolve a method token, mapping anything unknown to `NotImplemented`.
    ///
    /// Matching is case-sensitive: HTTP method tokens are.
    pub fn from_token(token: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|method| method.as_str() == token)
            .unwrap_or(Method::NotImplemented)
    }

    /// Whether a user handler may be registered for this method.
    ///
    /// TRACE is answered by the server itself and the sentinel never routes.
    pub fn is_routable(&self) -> bool {
        !matches!(self, Method::Trace | Method::NotImplemented)
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Method::from_token(s))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join methods as an `Allow` header value: sorted, de-duplicated, `", "`-separated.
pub fn allow_value<I>(methods: I) -> String
where
    I: IntoIterator<Item = Method>,
{
    let mut methods: Vec<Method> = methods.into_iter().collect();
    methods.sort();
    methods.dedup();
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tokens() {
        for method in Method::KNOWN {
            assert_eq!(Method::from_token(method.as_str()), method);
        }
    }

    #[test]
    fn test_unknown_token_is_sentinel() {
        assert_eq!(Method::from_token("BREW"), Method::NotImplemented);
        assert_eq!(Method::from_token("get"), Method::NotImplemented);
        assert_eq!("PROPFIND".parse::<Method>(), Ok(Method::NotImplemented));
    }

    #[test]
    fn test_routable() {
        assert!(Method::Get.is_routable());
        assert!(Method::Options.is_routable());
        assert!(!Method::Trace.is_routable());
        assert!(!Method::NotImplemented.is_routable());
    }

    #[test]
    fn test_allow_value_sorts_and_dedups() {
        let value = allow_value([Method::Post, Method::Get, Method::Post, Method::Delete]);
        assert_eq!(value, "GET, POST, DELETE");
        assert_eq!(allow_value(std::iter::empty()), "");
    }
}

//! Endpoint registry: target → method → handler.
//!
//! Filled before the server starts and frozen afterwards; lookups need no
//! synchronisation.

use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::response::Response;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// User request handler. `None` means the handler produced nothing and the
/// server answers `500`.
pub type Handler = Arc<dyn Fn(&Request) -> Option<Response> + Send + Sync>;

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Targets must be non-empty.
    EmptyTarget,
    /// A handler is already registered for this target and method.
    DuplicateHandler { target: String, method: Method },
    /// The method is answered by the server itself and cannot be mapped.
    UnroutableMethod(Method),
    /// Endpoints are read-only once the server has started.
    ServerStarted,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::EmptyTarget => write!(f, "Endpoint target must not be empty"),
            RegistrationError::DuplicateHandler { target, method } => {
                write!(f, "A {} handler is already registered for '{}'", method, target)
            }
            RegistrationError::UnroutableMethod(method) => {
                write!(f, "Handlers cannot be registered for {}", method)
            }
            RegistrationError::ServerStarted => {
                write!(f, "Endpoints cannot be registered after the server has started")
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// A registered target and its per-method handlers.
#[derive(Clone)]
pub struct Endpoint {
    target: String,
    handlers: BTreeMap<Method, Handler>,
}

impl Endpoint {
    fn new(target: String) -> Self {
        Self {
            target,
            handlers: BTreeMap::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn handler(&self, method: Method) -> Option<&Handler> {
        self.handlers.get(&method)
    }

    /// Registered methods in canonical order.
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.handlers.keys().copied()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("target", &self.target)
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// All endpoints, keyed by exact target.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    endpoints: HashMap<String, Endpoint>,
}

impl Endpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `(target, method)`.
    pub fn add(
        &mut self,
        target: &str,
        method: Method,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        if target.is_empty() {
            return Err(RegistrationError::EmptyTarget);
        }
        if !method.is_routable() {
            return Err(RegistrationError::UnroutableMethod(method));
        }

        let endpoint = self
            .endpoints
            .entry(target.to_string())
            .or_insert_with(|| Endpoint::new(target.to_string()));

        if endpoint.handlers.contains_key(&method) {
            return Err(RegistrationError::DuplicateHandler {
                target: target.to_string(),
                method,
            });
        }
        endpoint.handlers.insert(method, handler);
        Ok(())
    }

    pub fn get(&self, target: &str) -> Option<&Endpoint> {
        self.endpoints.get(target)
    }

    /// Every method registered on any endpoint, possibly repeated.
    pub fn all_methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.endpoints.values().flat_map(Endpoint::methods)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

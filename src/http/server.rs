//! The HTTP server: endpoint registration in front of a [`TransportServer`].

use crate::events::{EventBus, ServerEvent};
use crate::http::catalog::StatusCatalog;
use crate::http::endpoint::{Endpoints, RegistrationError};
use crate::http::header::HeaderGroups;
use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::router::Router;
use crate::http::standard::StandardResponses;
use crate::transport::{ConnectionId, TransportOptions, TransportServer};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// HTTP-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// Sent in the `Server` header and on error pages.
    pub name: String,
    /// Answer `TRACE` by echoing the request.
    pub trace_enabled: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            name: "Simple HTTP Server".to_string(),
            trace_enabled: false,
        }
    }
}

/// HTTP/1.0 and HTTP/1.1 server.
///
/// Register handlers with the `map_*` methods, then [`start`](Self::start).
/// Once started, the endpoint table is frozen and further registrations
/// fail with [`RegistrationError::ServerStarted`].
pub struct HttpServer {
    transport_options: TransportOptions,
    trace_enabled: bool,
    header_groups: HeaderGroups,
    responses: StandardResponses,
    events: EventBus,
    endpoints: Option<Endpoints>,
    transport: Option<TransportServer>,
}

impl HttpServer {
    /// Server using the standard header groups and the English status catalog.
    pub fn new(transport: TransportOptions, http: HttpOptions) -> Self {
        Self::with_tables(transport, http, HeaderGroups::standard(), StatusCatalog::english())
    }

    pub fn with_tables(
        transport: TransportOptions,
        http: HttpOptions,
        header_groups: HeaderGroups,
        catalog: StatusCatalog,
    ) -> Self {
        Self {
            transport_options: transport,
            trace_enabled: http.trace_enabled,
            header_groups,
            responses: StandardResponses::new(http.name, Arc::new(catalog)),
            events: EventBus::new(),
            endpoints: Some(Endpoints::new()),
            transport: None,
        }
    }

    /// The standard response generator, for handlers that want to answer
    /// with a canned page.
    pub fn responses(&self) -> StandardResponses {
        self.responses.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Register `handler` for `method` requests to exactly `target`.
    pub fn map<F>(&mut self, method: Method, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        let endpoints = self
            .endpoints
            .as_mut()
            .ok_or(RegistrationError::ServerStarted)?;
        endpoints.add(target, method, Arc::new(handler))?;
        Ok(self)
    }

    pub fn map_get<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Get, target, handler)
    }

    pub fn map_head<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Head, target, handler)
    }

    pub fn map_post<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Post, target, handler)
    }

    pub fn map_put<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Put, target, handler)
    }

    pub fn map_patch<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Patch, target, handler)
    }

    pub fn map_delete<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Delete, target, handler)
    }

    pub fn map_connect<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Connect, target, handler)
    }

    pub fn map_options<F>(&mut self, target: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.map(Method::Options, target, handler)
    }

    /// Freeze the endpoints and start listening. Must be called from within
    /// a tokio runtime.
    ///
    /// After a [`stop`](Self::stop) the same endpoints are served again.
    pub fn start(&mut self) -> io::Result<SocketAddr> {
        if self.transport.is_none() {
            let endpoints = self.endpoints.take().unwrap_or_default();
            info!(endpoints = endpoints.len(), trace = self.trace_enabled, "Freezing endpoints");

            let router = Router::new(
                endpoints,
                self.header_groups.clone(),
                self.responses.clone(),
                self.trace_enabled,
                self.events.clone(),
            );
            self.transport = Some(TransportServer::new(
                self.transport_options.clone(),
                Arc::new(router),
                self.events.clone(),
            ));
        }

        match &self.transport {
            Some(transport) => transport.start(),
            None => Err(io::Error::other("transport not initialised")),
        }
    }

    /// Stop listening. Open connections finish their current exchange.
    pub async fn stop(&self) {
        if let Some(transport) = &self.transport {
            transport.stop().await;
        }
    }

    /// Close a live connection. Returns whether it was found.
    pub fn close_connection(&self, id: ConnectionId) -> bool {
        self.transport
            .as_ref()
            .is_some_and(|transport| transport.close_connection(id))
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.as_ref().and_then(TransportServer::local_addr)
    }

    pub fn is_running(&self) -> bool {
        self.transport
            .as_ref()
            .is_some_and(TransportServer::is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::header::HeaderGroup;
    use crate::http::status::StatusCode;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    const WAIT: Duration = Duration::from_secs(5);

    fn server(read_timeout: Option<Duration>) -> HttpServer {
        let transport = TransportOptions {
            listen: "127.0.0.1:0".parse().unwrap(),
            read_timeout,
            ..TransportOptions::default()
        };
        let http = HttpOptions {
            name: "Test Server".to_string(),
            trace_enabled: true,
        };
        HttpServer::new(transport, http)
    }

    async fn exchange(addr: SocketAddr, request: &str) -> String {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        tokio::time::timeout(WAIT, client.read_to_end(&mut buf))
            .await
            .unwrap()
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    /// Read one response whose body length is given by `Content-Length`.
    async fn read_response(client: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = tokio::time::timeout(WAIT, client.read(&mut chunk))
                .await
                .unwrap()
                .unwrap();
            assert!(n > 0, "connection closed early");
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            let Some(length) = text
                .split("\r\n")
                .find_map(|line| line.strip_prefix("Content-Length: "))
                .and_then(|v| v.parse::<usize>().ok())
            else {
                continue;
            };
            let expected = match text.find("\r\n\r\n") {
                Some(head) => head + 4 + length,
                None if length == 0 => text.len(),
                None => continue,
            };
            if buf.len() >= expected {
                return text.into_owned();
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end_routing() {
        let mut server = server(None);
        server
            .map_get("/hello", |_| Some(Response::ok().with_body("hi")))
            .unwrap()
            .map_post("/echo", |r| {
                Some(Response::ok().with_body(r.body().map(|b| b.to_vec()).unwrap_or_default()))
            })
            .unwrap();
        let addr = server.start().unwrap();

        let text = exchange(addr, "GET /hello HTTP/1.0\r\n\r\n").await;
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));

        let text = exchange(addr, "POST /echo HTTP/1.0\r\n\r\nping").await;
        assert!(text.ends_with("\r\n\r\nping"));

        let text = exchange(addr, "PUT /hello HTTP/1.0\r\n\r\n").await;
        assert!(text.starts_with("HTTP/1.0 405 Method Not Allowed\r\n"));
        assert!(text.contains("\r\nAllow: GET\r\n"));

        let text = exchange(addr, "OPTIONS * HTTP/1.0\r\n\r\n").await;
        assert!(text.contains("\r\nAllow: GET, POST"));

        let text = exchange(addr, "TRACE /x HTTP/1.0\r\n\r\n").await;
        assert!(text.contains("\r\nContent-Type: message/http\r\n"));
        assert!(text.ends_with("\r\n\r\nTRACE /x HTTP/1.0\r\n\r\n"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_keep_alive_across_requests() {
        let mut server = server(Some(Duration::from_millis(300)));
        server
            .map_get("/", |_| Some(Response::ok().with_body("root")))
            .unwrap();
        let addr = server.start().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let request = "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: keep-alive\r\n\r\n";

        client.write_all(request.as_bytes()).await.unwrap();
        let first = read_response(&mut client).await;
        assert!(first.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(first.contains("\r\nConnection: keep-alive"));

        client.write_all(request.as_bytes()).await.unwrap();
        let second = read_response(&mut client).await;
        assert!(second.ends_with("\r\n\r\nroot"));

        // Idle timeout closes without writing anything further.
        let mut rest = Vec::new();
        tokio::time::timeout(WAIT, client.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.is_empty());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_request_closes() {
        let mut server = server(None);
        let addr = server.start().unwrap();

        let text = exchange(addr, "nonsense\r\n\r\n").await;
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.contains("<title>400 Bad Request</title>"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_registration_after_start_fails() {
        let mut server = server(None);
        server.map_get("/", |_| Some(Response::ok())).unwrap();
        server.start().unwrap();

        let err = server
            .map_get("/late", |_| Some(Response::ok()))
            .err()
            .unwrap();
        assert_eq!(err, RegistrationError::ServerStarted);

        server.stop().await;
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_restart_serves_same_endpoints() {
        let mut server = server(None);
        server.map_get("/", |_| Some(Response::ok())).unwrap();

        server.start().unwrap();
        server.stop().await;

        let addr = server.start().unwrap();
        let text = exchange(addr, "GET / HTTP/1.0\r\n\r\n").await;
        assert!(text.starts_with("HTTP/1.0 200 OK"));
        server.stop().await;
    }

    #[tokio::test]
    async fn test_handler_uses_standard_responses() {
        let mut server = server(None);
        let responses = server.responses();
        server
            .map_get("/busy", move |_| {
                responses
                    .generate(
                        StatusCode::ServiceUnavailable,
                        [crate::http::header::Header::new(
                            HeaderGroup::Response,
                            "Retry-After",
                            "30",
                        )],
                    )
                    .ok()
            })
            .unwrap();
        let addr = server.start().unwrap();

        let text = exchange(addr, "GET /busy HTTP/1.0\r\n\r\n").await;
        assert!(text.starts_with("HTTP/1.0 503 Service Unavailable\r\n"));
        assert!(text.contains("\r\nRetry-After: 30\r\n"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_close_connection_by_id() {
        let mut server = server(None);
        server.map_get("/", |_| Some(Response::ok())).unwrap();
        let mut events = server.subscribe();
        let addr = server.start().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let id = tokio::time::timeout(WAIT, async {
            loop {
                if let ServerEvent::ConnectionOpened(c) = events.recv().await.unwrap() {
                    return c.id;
                }
            }
        })
        .await
        .unwrap();

        assert!(server.close_connection(id));
        let mut buf = Vec::new();
        tokio::time::timeout(WAIT, client.read_to_end(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert!(buf.is_empty());

        server.stop().await;
    }
}

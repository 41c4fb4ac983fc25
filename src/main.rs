//! simple-httpd: a minimal HTTP/1.0 and HTTP/1.1 server
//!
//! Serves a few demo endpoints:
//! - `GET /` returns a greeting
//! - `POST /echo` returns the request body
//! - `GET /busy` answers 503 with `Retry-After`
//!
//! Configuration via CLI arguments or TOML file. Stops on Ctrl-C.

use simple_httpd::config::Config;
use simple_httpd::http::{Header, HeaderGroup, HttpServer, Response, StatusCode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        buffer_size = config.buffer_size,
        read_timeout = ?config.read_timeout,
        trace_enabled = config.trace_enabled,
        "Starting simple-httpd"
    );

    let mut server = HttpServer::with_tables(
        config.transport_options(),
        config.http_options(),
        config.header_groups()?,
        config.status_catalog()?,
    );

    let responses = server.responses();
    server
        .map_get("/", |_| {
            Some(
                Response::ok()
                    .with_content_type("text/plain; charset=utf-8")
                    .with_body("Hello from simple-httpd\n"),
            )
        })?
        .map_post("/echo", |request| {
            let body = request.body().map(|b| b.to_vec()).unwrap_or_default();
            let content_type = request
                .header("Content-Type")
                .unwrap_or("application/octet-stream")
                .to_string();
            Some(Response::ok().with_content_type(content_type).with_body(body))
        })?
        .map_get("/busy", move |_| {
            let retry_after = Header::new(HeaderGroup::Response, "Retry-After", "30");
            match responses.generate(StatusCode::ServiceUnavailable, [retry_after]) {
                Ok(response) => Some(response),
                Err(e) => {
                    warn!(error = %e, "Failed to build busy response");
                    None
                }
            }
        })?;

    server.start()?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.stop().await;

    Ok(())
}

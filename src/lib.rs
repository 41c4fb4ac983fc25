//! A minimal HTTP/1.0 and HTTP/1.1 server.
//!
//! [`transport`] accepts TCP connections and runs read → handle → write
//! cycles without knowing the protocol. [`http`] parses requests, routes
//! them to registered handlers and serialises responses.

pub mod config;
pub mod events;
pub mod http;
pub mod transport;

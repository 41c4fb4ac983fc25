//! Lifecycle notifications.
//!
//! Events are observation-only: they are published on a broadcast channel and
//! dropped when nobody subscribes or a subscriber lags. Publishing never
//! blocks the server.

use crate::http::status::StatusCode;
use crate::transport::{Connection, ConnectionId};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber.
const EVENT_CAPACITY: usize = 256;

/// Something observable happened in the server.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// The listener is bound and accepting.
    ServerStarted { local_addr: SocketAddr },
    /// The listener was released. `error` is set when stopping failed or
    /// when a fatal accept error brought the server down.
    ServerStopped {
        local_addr: SocketAddr,
        error: Option<Arc<io::Error>>,
    },
    ConnectionOpened(Connection),
    ConnectionClosed(Connection),
    /// One read → handle → write cycle completed on a connection.
    FrameHandled {
        connection: ConnectionId,
        request_bytes: usize,
        response_bytes: usize,
    },
    /// The HTTP layer answered a frame. `request_line` is `None` when the
    /// frame did not parse.
    RequestHandled {
        connection: ConnectionId,
        request_line: Option<String>,
        status: StatusCode,
    },
    /// A connection was torn down by a transport fault (timeout, reset, ...).
    ConnectionFailed {
        connection: ConnectionId,
        error: Arc<io::Error>,
    },
    /// Accepting failed; the server stops.
    AcceptFailed { error: Arc<io::Error> },
}

/// Publisher side of the event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ServerEvent) {
        // Err only means there are no subscribers.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

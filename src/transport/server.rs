//! TCP server: accepts connections and runs one read → handle → write cycle
//! per frame on each of them.
//!
//! The server knows nothing about HTTP. A frame is whatever arrived in one
//! read burst; the [`FrameHandler`] decides what to send back and whether the
//! connection stays open.

use crate::events::{EventBus, ServerEvent};
use crate::transport::connection::{lock, Connection, ConnectionId, ConnectionRegistry};
use crate::transport::deadline::IdleDeadline;
use crate::transport::frame::{Frame, FrameHandler};
use bytes::{Bytes, BytesMut};
use std::io;
use std::any::Any;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Reply sent when the handler has nothing to say.
const EMPTY_REPLY: &[u8] = &[0];

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub listen: SocketAddr,
    /// Listen backlog.
    pub backlog: u32,
    /// Size of each socket read. Frames may span several reads.
    pub buffer_size: usize,
    /// Idle time allowed before the next frame. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            backlog: 1024,
            buffer_size: 1024,
            read_timeout: None,
        }
    }
}

struct Running {
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

struct Shared {
    options: TransportOptions,
    handler: Arc<dyn FrameHandler>,
    registry: ConnectionRegistry,
    events: EventBus,
    running: Mutex<Option<Running>>,
}

impl Shared {
    /// Clear the running state after a fatal accept error, unless a later
    /// start already replaced it.
    fn finish(&self, shutdown: &Arc<Notify>, local_addr: SocketAddr, error: Arc<io::Error>) {
        let mut running = lock(&self.running);
        if running
            .as_ref()
            .is_some_and(|r| Arc::ptr_eq(&r.shutdown, shutdown))
        {
            running.take();
        }
        drop(running);

        self.events.emit(ServerEvent::ServerStopped {
            local_addr,
            error: Some(error),
        });
    }
}

/// TCP transport server.
pub struct TransportServer {
    shared: Arc<Shared>,
}

impl TransportServer {
    pub fn new(options: TransportOptions, handler: Arc<dyn FrameHandler>, events: EventBus) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                handler,
                registry: ConnectionRegistry::new(),
                events,
                running: Mutex::new(None),
            }),
        }
    }

    /// Bind and begin accepting. Must be called from within a tokio runtime.
    ///
    /// Starting a running server is a no-op that returns the bound address.
    pub fn start(&self) -> io::Result<SocketAddr> {
        let mut running = lock(&self.shared.running);
        if let Some(running) = running.as_ref() {
            return Ok(running.local_addr);
        }

        let options = &self.shared.options;
        let listener = bind_listener(options.listen, options.backlog)?;
        let local_addr = listener.local_addr()?;
        let shutdown = Arc::new(Notify::new());

        info!(address = %local_addr, "Server listening");
        self.shared
            .events
            .emit(ServerEvent::ServerStarted { local_addr });

        let task = tokio::spawn(accept_loop(
            Arc::clone(&self.shared),
            listener,
            local_addr,
            Arc::clone(&shutdown),
        ));

        *running = Some(Running {
            local_addr,
            shutdown,
            task,
        });

        Ok(local_addr)
    }

    /// Stop accepting and release the listener.
    ///
    /// Connections already accepted keep being served until they close.
    pub async fn stop(&self) {
        let Some(running) = lock(&self.shared.running).take() else {
            return;
        };

        running.shutdown.notify_one();
        let error = running
            .task
            .await
            .err()
            .map(|e| Arc::new(io::Error::other(e)));

        match &error {
            Some(e) => error!(address = %running.local_addr, error = %e, "Server stopped with error"),
            None => info!(address = %running.local_addr, "Server stopped"),
        }
        self.shared.events.emit(ServerEvent::ServerStopped {
            local_addr: running.local_addr,
            error,
        });
    }

    /// Close a live connection. Returns whether it was found.
    pub fn close_connection(&self, id: ConnectionId) -> bool {
        let found = self.shared.registry.close(id);
        debug!(connection = %id, found, "Close requested");
        found
    }

    /// Whether `id` names a connection that is still open.
    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.shared.registry.contains(id)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        lock(&self.shared.running).as_ref().map(|r| r.local_addr)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.running).is_some()
    }

    /// Number of connections currently open.
    pub fn connection_count(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.shared.events.subscribe()
    }
}

/// Create a non-blocking listener with SO_REUSEADDR and the given backlog.
fn bind_listener(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;

    TcpListener::from_std(socket.into())
}

async fn accept_loop(
    shared: Arc<Shared>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.notified() => return,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, remote)) => {
                let (connection, close) = shared.registry.register(remote);
                debug!(connection = %connection.id, peer = %remote, "New connection");
                shared.events.emit(ServerEvent::ConnectionOpened(connection));

                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    serve_connection(shared, stream, connection, close).await;
                });
            }
            Err(e) => {
                error!(address = %local_addr, error = %e, "Failed to accept connection");
                let error = Arc::new(e);
                shared.events.emit(ServerEvent::AcceptFailed {
                    error: Arc::clone(&error),
                });
                shared.finish(&shutdown, local_addr, error);
                return;
            }
        }
    }
}

/// Untracks a connection and reports it closed, even if its task unwinds.
struct ConnectionGuard<'a> {
    shared: &'a Shared,
    connection: Connection,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.shared.registry.remove(self.connection.id);
        debug!(connection = %self.connection.id, "Connection closed");
        self.shared
            .events
            .emit(ServerEvent::ConnectionClosed(self.connection));
    }
}

async fn serve_connection(
    shared: Arc<Shared>,
    mut stream: TcpStream,
    connection: Connection,
    close: Arc<Notify>,
) {
    let _guard = ConnectionGuard {
        shared: &shared,
        connection,
    };

    let result = tokio::select! {
        _ = close.notified() => {
            debug!(connection = %connection.id, "Closing on request");
            Ok(())
        }
        result = run_cycles(&shared, &mut stream, connection) => result,
    };

    if let Err(e) = result {
        match e.kind() {
            io::ErrorKind::TimedOut => {
                debug!(connection = %connection.id, "Read timed out")
            }
            io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => {
                debug!(connection = %connection.id, error = %e, "Connection reset")
            }
            _ => warn!(connection = %connection.id, error = %e, "Connection error"),
        }
        shared.events.emit(ServerEvent::ConnectionFailed {
            connection: connection.id,
            error: Arc::new(e),
        });
    }

    if let Err(e) = stream.shutdown().await {
        trace!(connection = %connection.id, error = %e, "Shutdown failed");
    }
}

/// Serve frames until the handler asks to close, the peer hangs up, or the
/// idle deadline passes.
async fn run_cycles(
    shared: &Shared,
    stream: &mut TcpStream,
    connection: Connection,
) -> io::Result<()> {
    let mut buffer = vec![0u8; shared.options.buffer_size.max(1)];
    let mut deadline = IdleDeadline::new(shared.options.read_timeout);

    loop {
        let Some(bytes) = deadline.run(read_frame(stream, &mut buffer)).await? else {
            trace!(connection = %connection.id, "Connection closed by client");
            return Ok(());
        };

        let request_bytes = bytes.len();
        let frame = Frame { bytes, connection };
        let handled = panic::catch_unwind(AssertUnwindSafe(|| shared.handler.handle(&frame)))
            .map_err(|payload| {
                io::Error::other(format!("handler panicked: {}", panic_message(&*payload)))
            })?;
        let (reply, keep_alive) = match handled {
            Some(reply) if reply.bytes.is_empty() => (Bytes::from_static(EMPTY_REPLY), reply.keep_alive),
            Some(reply) => (reply.bytes, reply.keep_alive),
            None => (Bytes::from_static(EMPTY_REPLY), false),
        };

        stream.write_all(&reply).await?;
        stream.flush().await?;

        trace!(
            connection = %connection.id,
            request_bytes,
            response_bytes = reply.len(),
            keep_alive,
            "Frame handled"
        );
        shared.events.emit(ServerEvent::FrameHandled {
            connection: connection.id,
            request_bytes,
            response_bytes: reply.len(),
        });

        if !keep_alive {
            return Ok(());
        }
        deadline.rearm();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Read one frame: a blocking read, then everything that is immediately
/// available. `None` means the peer closed before sending anything.
async fn read_frame(stream: &mut TcpStream, buffer: &mut [u8]) -> io::Result<Option<Bytes>> {
    let n = stream.read(buffer).await?;
    if n == 0 {
        return Ok(None);
    }

    let mut frame = BytesMut::with_capacity(n);
    frame.extend_from_slice(&buffer[..n]);

    loop {
        match stream.try_read(buffer) {
            Ok(0) => break,
            Ok(n) => frame.extend_from_slice(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }

    Ok(Some(frame.freeze()))
}

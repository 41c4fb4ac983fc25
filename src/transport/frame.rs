//! The unit of work passed between the transport and the protocol layer.

use crate::transport::connection::Connection;
use bytes::Bytes;

/// Bytes received in one read burst.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Bytes,
    pub connection: Connection,
}

/// What to send back for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Written as-is. An empty reply is sent as a single zero byte.
    pub bytes: Bytes,
    /// Keep reading from the connection after the write.
    pub keep_alive: bool,
}

impl Reply {
    pub fn close(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            keep_alive: false,
        }
    }

    pub fn keep_alive(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            keep_alive: true,
        }
    }
}

/// Turns a frame into a reply. `None` answers with a zero byte and closes.
///
/// Invoked concurrently from many connection tasks.
pub trait FrameHandler: Send + Sync + 'static {
    fn handle(&self, frame: &Frame) -> Option<Reply>;
}

impl<F> FrameHandler for F
where
    F: Fn(&Frame) -> Option<Reply> + Send + Sync + 'static,
{
    fn handle(&self, frame: &Frame) -> Option<Reply> {
        self(frame)
    }
}

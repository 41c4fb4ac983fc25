//! Per-connection idle read deadline.

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Deadline for the next frame on a connection.
///
/// Armed when the connection is accepted and re-armed after every completed
/// cycle. `None` timeout never expires.
#[derive(Debug, Clone, Copy)]
pub struct IdleDeadline {
    timeout: Option<Duration>,
    expires_at: Option<Instant>,
}

impl IdleDeadline {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut deadline = Self {
            timeout,
            expires_at: None,
        };
        deadline.rearm();
        deadline
    }

    /// Restart the countdown from now.
    pub fn rearm(&mut self) {
        self.expires_at = self.timeout.map(|timeout| Instant::now() + timeout);
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Resolves when the deadline passes. Never resolves without a timeout.
    pub async fn expired(&self) {
        match self.expires_at {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    }

    /// Run `io` unless the deadline passes first, in which case it is
    /// cancelled and `TimedOut` is returned.
    pub async fn run<T, F>(&self, io: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        tokio::select! {
            result = io => result,
            _ = self.expired() => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "no data received before the read timeout",
            )),
        }
    }
}

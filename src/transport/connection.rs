//! Connection identity and the registry of live connections.
//!
//! The registry is the only structure shared mutably between connection
//! tasks. It maps an id to the handle used to close that connection from the
//! outside.

use slab::Slab;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Opaque, unique connection identifier.
///
/// The slot indexes the registry; the serial keeps ids unique when a slot is
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    slot: usize,
    serial: u64,
}

impl ConnectionId {
    #[cfg(test)]
    pub(crate) fn new(slot: usize, serial: u64) -> Self {
        Self { slot, serial }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.serial)
    }
}

/// An accepted client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub remote: SocketAddr,
}

struct Entry {
    connection: Connection,
    close: Arc<Notify>,
}

/// Registry of live connections using slab allocation.
pub(crate) struct ConnectionRegistry {
    connections: Mutex<Slab<Entry>>,
    next_serial: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Slab::new()),
            next_serial: AtomicU64::new(1),
        }
    }

    /// Track a newly accepted connection.
    ///
    /// Returns the connection and the signal its task must watch for an
    /// external close.
    pub fn register(&self, remote: SocketAddr) -> (Connection, Arc<Notify>) {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let close = Arc::new(Notify::new());

        let mut connections = lock(&self.connections);
        let entry = connections.vacant_entry();
        let connection = Connection {
            id: ConnectionId {
                slot: entry.key(),
                serial,
            },
            remote,
        };
        entry.insert(Entry {
            connection,
            close: Arc::clone(&close),
        });

        (connection, close)
    }

    /// Stop tracking a connection. Returns whether it was tracked.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut connections = lock(&self.connections);
        match connections.get(id.slot) {
            Some(entry) if entry.connection.id == id => {
                connections.remove(id.slot);
                true
            }
            _ => false,
        }
    }

    /// Ask a tracked connection to close. Returns whether it was found.
    pub fn close(&self, id: ConnectionId) -> bool {
        let connections = lock(&self.connections);
        match connections.get(id.slot) {
            Some(entry) if entry.connection.id == id => {
                // A stored permit is picked up even if the task is mid-write.
                entry.close.notify_one();
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        lock(&self.connections)
            .get(id.slot)
            .is_some_and(|entry| entry.connection.id == id)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        lock(&self.connections).len()
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_register_and_remove() {
        let registry = ConnectionRegistry::new();
        let (c1, _) = registry.register(addr());
        let (c2, _) = registry.register(addr());

        assert_ne!(c1.id, c2.id);
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(c1.id));
        assert!(!registry.remove(c1.id));
        assert!(!registry.contains(c1.id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reused_slot_gets_fresh_id() {
        let registry = ConnectionRegistry::new();
        let (old, _) = registry.register(addr());
        registry.remove(old.id);

        let (new, _) = registry.register(addr());
        assert_ne!(old.id, new.id);
        assert!(!registry.close(old.id));
        assert!(registry.close(new.id));
    }

    #[tokio::test]
    async fn test_close_signals_task() {
        let registry = ConnectionRegistry::new();
        let (connection, close) = registry.register(addr());

        assert!(registry.close(connection.id));
        // Permit was stored before anyone waited.
        close.notified().await;
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionId::new(0, 7).to_string(), "conn-7");
    }
}

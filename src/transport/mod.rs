//! Protocol-agnostic TCP transport.

mod connection;
mod deadline;
mod frame;
mod server;

pub use connection::{Connection, ConnectionId};
pub use deadline::IdleDeadline;
pub use frame::{Frame, FrameHandler, Reply};
pub use server::{TransportOptions, TransportServer};

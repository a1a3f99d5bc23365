//! Connection layer for the effect service: the transport capability trait,
//! the live TCP client, and the supervising reconnect loop.

mod client;
mod supervisor;
mod transport;

pub use client::IpcClient;
pub use supervisor::LinkSupervisor;
pub use transport::{EffectTransport, NullTransport, RecordingTransport, TransportOp};

use std::fmt;

/// Which physical controller an effect command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControllerTarget {
    Left = 0,
    Right = 1,
    Both = 2,
}

/// Connection status of the effect-service link. Written by the supervisor,
/// read by everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// A status transition pushed to the UI side, with display text.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEvent {
    pub state: ConnectionState,
    pub message: String,
}

/// Result type for transport operations.
pub type LinkResult<T = ()> = Result<T, LinkError>;

/// Error from a transport operation.
#[derive(Debug, Clone)]
pub struct LinkError(pub String);

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for LinkError {}

impl From<std::io::Error> for LinkError {
    fn from(e: std::io::Error) -> Self {
        LinkError(e.to_string())
    }
}

impl From<String> for LinkError {
    fn from(s: String) -> Self {
        LinkError(s)
    }
}

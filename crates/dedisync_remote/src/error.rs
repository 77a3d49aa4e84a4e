//! Fault taxonomy for the remote-control surface.

use thiserror::Error;

/// Result type for guarded remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A fault raised by the remote-control protocol layer.
///
/// The transport is an opaque collaborator: every call either returns a
/// value or raises one of these. `code` carries the protocol-level fault
/// code when the server rejected the call, and 0 when the failure happened
/// on the transport side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fault {code}: {message}")]
pub struct ProtocolFault {
    /// Protocol fault code reported by the server, 0 for transport faults.
    pub code: i32,
    /// Human-readable fault description.
    pub message: String,
}

impl ProtocolFault {
    /// Creates a fault with an explicit protocol code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a transport-side fault (code 0).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

/// Errors surfaced by operations that go through the connection guard.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The capability is not connected; no call was issued.
    #[error("not connected to the dedicated server")]
    NotConnected,

    /// The remote side raised a fault.
    #[error(transparent)]
    Fault(#[from] ProtocolFault),
}
